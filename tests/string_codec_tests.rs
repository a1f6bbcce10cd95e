/// Integration tests for string value codecs (the fruit cache samples)

#[cfg(test)]
mod tests {
    use serialito::{Codec, CodecState, DirectoryContext, PlainCodec, ValueCodec};
    use std::collections::HashMap;

    const FRUITS: [(u64, &str); 3] = [(1, "apple"), (2, "banana"), (3, "cherry")];

    fn fill(codec: &Codec<String>) -> HashMap<u64, Vec<u8>> {
        FRUITS
            .iter()
            .map(|(key, fruit)| (*key, codec.encode(&fruit.to_string()).unwrap().into_bytes()))
            .collect()
    }

    #[test]
    fn test_transient_fruit_cache() {
        let codec = Codec::<String>::transient().unwrap();
        let cache = fill(&codec);

        assert_eq!(codec.decode(&cache[&2]).unwrap(), "banana");
        assert!(codec.equals(&"cherry".to_string(), &cache[&3]).unwrap());
        assert!(!codec.equals(&"cherry".to_string(), &cache[&1]).unwrap());
        codec.close().unwrap();
    }

    #[test]
    fn test_persistent_fruit_cache_across_restart() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().unwrap();
        let context = DirectoryContext::new(dir.path().join("fruits"));

        let codec = Codec::<String>::persistent(&context).unwrap();
        let cache = fill(&codec);
        codec.close().unwrap();
        assert_eq!(codec.state(), CodecState::Closed);

        // The records outlive the codec; a new codec on the same location reads them
        let codec = Codec::<String>::persistent(&context).unwrap();
        for (key, fruit) in FRUITS {
            assert_eq!(codec.decode(&cache[&key]).unwrap(), fruit);
        }
        codec.close().unwrap();
    }

    #[test]
    fn test_empty_and_unicode_strings() {
        let codec = Codec::<String>::transient().unwrap();
        for value in ["", "pomme de terre", "りんご", "🍓"] {
            let record = codec.encode(&value.to_string()).unwrap();
            assert_eq!(codec.decode(&record).unwrap(), value);
        }
    }

    #[test]
    fn test_plain_string_codec() {
        let codec = PlainCodec::<String>::new();
        let record = codec.encode(&"durian".to_string()).unwrap();
        assert_eq!(codec.decode(&record).unwrap(), "durian");
    }
}
