/// Integration tests for transient codecs and the Registered derive

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use serialito::{
        Codec, DecodingError, EncodingError, PlainCodec, Registered, RegistrationPolicy,
        TypeDescriptor, TypeIdentifier, ValueCodec,
    };
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::thread;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Registered)]
    struct Description {
        alias: String,
        code: u32,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Registered)]
    #[registered(name = "sample.Employee")]
    struct Employee {
        id: u64,
        name: String,
        age: u32,
        description: Description,
        tags: Vec<String>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Registered)]
    enum Shape {
        Circle { radius: f64 },
        Square(f64),
        Empty,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize, Registered)]
    struct Wrapper<T> {
        inner: T,
    }

    fn random_string(rng: &mut fastrand::Rng) -> String {
        let len = rng.usize(0..32);
        (0..len).map(|_| rng.alphanumeric()).collect()
    }

    fn random_employee(rng: &mut fastrand::Rng) -> Employee {
        Employee {
            id: rng.u64(..),
            name: random_string(rng),
            age: rng.u32(..120),
            description: Description {
                alias: random_string(rng),
                code: rng.u32(..),
            },
            tags: (0..rng.usize(0..4)).map(|_| random_string(rng)).collect(),
        }
    }

    #[test]
    fn test_derived_descriptors() {
        assert_eq!(Description::type_descriptor(), TypeDescriptor::new("Description"));
        assert_eq!(Employee::TYPE_NAME, "sample.Employee");
        assert_eq!(Shape::TYPE_NAME, "Shape");
        assert_eq!(<Wrapper<u8> as Registered>::TYPE_NAME, "Wrapper");
    }

    #[test]
    fn test_random_round_trips() {
        let mut rng = fastrand::Rng::with_seed(0x5e71a1);
        let codec = Codec::<Employee>::transient().unwrap();

        for _ in 0..200 {
            let value = random_employee(&mut rng);
            let record = codec.encode(&value).unwrap();
            assert_eq!(codec.decode(&record).unwrap(), value);
            assert!(codec.equals(&value, &record).unwrap());
        }
    }

    #[test]
    fn test_enum_values() {
        let codec = Codec::<Shape>::transient().unwrap();
        for shape in [Shape::Circle { radius: 1.5 }, Shape::Square(2.0), Shape::Empty] {
            let record = codec.encode(&shape).unwrap();
            assert_eq!(codec.decode(&record).unwrap(), shape);
        }
    }

    #[test]
    fn test_equals_detects_difference() {
        let mut rng = fastrand::Rng::with_seed(7);
        let codec = Codec::<Employee>::transient().unwrap();

        let value = random_employee(&mut rng);
        let mut other = value.clone();
        other.description.code = other.description.code.wrapping_add(1);

        let record = codec.encode(&value).unwrap();
        assert!(codec.equals(&value, &record).unwrap());
        assert!(!codec.equals(&other, &record).unwrap());
    }

    #[test]
    fn test_pre_registration_order_decides_identifiers() {
        let codec = Codec::<Employee>::builder()
            .register::<Employee>()
            .register_descriptor("Person")
            .register::<Description>()
            .open()
            .unwrap();

        let registry = codec.registry();
        assert_eq!(
            registry.resolve_type(&Employee::type_descriptor()).unwrap(),
            TypeIdentifier::new(0)
        );
        assert_eq!(
            registry.resolve_type(&TypeDescriptor::new("Person")).unwrap(),
            TypeIdentifier::new(1)
        );
        assert_eq!(
            registry.resolve_type(&Description::type_descriptor()).unwrap(),
            TypeIdentifier::new(2)
        );
    }

    #[test]
    fn test_unregistered_type_is_rejected() {
        let codec = Codec::<Description>::builder()
            .register::<Employee>()
            .open()
            .unwrap();

        let value = Description {
            alias: "bar".to_string(),
            code: 879,
        };
        assert!(matches!(
            codec.encode(&value),
            Err(EncodingError::UnregisteredType(_))
        ));

        // Registering after open makes it encodable
        codec.registry().register_type::<Description>().unwrap();
        let record = codec.encode(&value).unwrap();
        assert_eq!(codec.decode(&record).unwrap(), value);
    }

    #[test]
    fn test_on_demand_registration_follows_encode_order() {
        let codec = Codec::<Description>::builder()
            .register::<Employee>()
            .registration(RegistrationPolicy::OnDemand)
            .open()
            .unwrap();

        codec
            .encode(&Description {
                alias: "x".to_string(),
                code: 1,
            })
            .unwrap();
        assert_eq!(
            codec.registry().resolve_type(&Description::type_descriptor()).unwrap(),
            TypeIdentifier::new(1)
        );
    }

    #[test]
    fn test_unsupported_value_shape() {
        #[derive(Debug, PartialEq, Serialize, Deserialize, Registered)]
        struct Extensible {
            id: u32,
            #[serde(flatten)]
            extra: HashMap<String, u32>,
        }

        let codec = Codec::<Extensible>::transient().unwrap();
        let value = Extensible {
            id: 1,
            extra: HashMap::from([("a".to_string(), 1)]),
        };
        assert!(matches!(
            codec.encode(&value),
            Err(EncodingError::Serialize(_))
        ));
    }

    #[test]
    fn test_corrupt_records_fail_individually() {
        let mut rng = fastrand::Rng::with_seed(42);
        let codec = Codec::<Employee>::transient().unwrap();
        let good = codec.encode(&random_employee(&mut rng)).unwrap();

        assert!(matches!(
            codec.decode(&[0x09]),
            Err(DecodingError::UnknownTypeTag(tag)) if tag == TypeIdentifier::new(9)
        ));
        assert!(matches!(
            codec.decode(&good[..1]),
            Err(DecodingError::Malformed(_))
        ));
        assert!(codec.decode(&good).is_ok());
    }

    #[test]
    fn test_concurrent_encoders_share_one_identifier() {
        let codec = Arc::new(
            Codec::<Employee>::builder()
                .registration(RegistrationPolicy::OnDemand)
                .open()
                .unwrap(),
        );

        let handles: Vec<_> = (0..8u64)
            .map(|seed| {
                let codec = Arc::clone(&codec);
                thread::spawn(move || {
                    let mut rng = fastrand::Rng::with_seed(seed);
                    let mut records = Vec::new();
                    for _ in 0..50 {
                        let value = random_employee(&mut rng);
                        records.push((codec.encode(&value).unwrap(), value));
                    }
                    records
                })
            })
            .collect();

        let records: Vec<_> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();

        assert_eq!(codec.registry().len(), 1);
        for (record, value) in &records {
            assert_eq!(record[0], 0);
            assert_eq!(&codec.decode(record).unwrap(), value);
        }
    }

    #[test]
    fn test_codecs_behind_the_cache_trait() {
        let codecs: Vec<Box<dyn ValueCodec<Description>>> = vec![
            Box::new(Codec::<Description>::transient().unwrap()),
            Box::new(PlainCodec::<Description>::new()),
        ];

        let value = Description {
            alias: "bar".to_string(),
            code: 879,
        };
        for codec in &codecs {
            let record = codec.encode(&value).unwrap();
            assert!(codec.equals(&value, &record).unwrap());
            codec.close().unwrap();
        }
    }

    #[cfg(feature = "stats")]
    #[test]
    fn test_stats_count_failures() {
        let codec = Codec::<Description>::builder().open().unwrap();
        let value = Description {
            alias: "bar".to_string(),
            code: 879,
        };

        assert!(codec.encode(&value).is_err());
        assert!(codec.decode(&[]).is_err());

        assert_eq!(codec.stats().encode_failures(), 1);
        assert_eq!(codec.stats().decode_failures(), 1);
        assert_eq!(codec.stats().encodes(), 0);
    }
}
