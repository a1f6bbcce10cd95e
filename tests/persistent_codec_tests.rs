/// Integration tests for persistent codecs surviving a restart

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use serialito::{
        Codec, CodecBuilder, CodecConfig, CodecError, CodecState, DecodingError,
        DirectoryContext, FileStateStore, PersistFailurePolicy, Registered, RegistryStateStore,
        StoreError, TypeDescriptor, TypeIdentifier, STATE_FILE_NAME,
    };
    use std::fs;
    use std::path::Path;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Registered)]
    struct Description {
        alias: String,
        code: u32,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Registered)]
    struct Person {
        name: String,
        age: u32,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Registered)]
    struct Employee {
        id: u64,
        name: String,
        age: u32,
        description: Description,
    }

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn employee() -> Employee {
        Employee {
            id: 1234,
            name: "foo".to_string(),
            age: 23,
            description: Description {
                alias: "bar".to_string(),
                code: 879,
            },
        }
    }

    /// Builder registering the sample types in their fixed order.
    fn employee_codec(context: &DirectoryContext) -> CodecBuilder<Employee> {
        Codec::<Employee>::builder()
            .register::<Employee>()
            .register::<Person>()
            .register::<Description>()
            .persistent(FileStateStore::new(), context)
    }

    #[test]
    fn test_first_run_starts_empty_and_writes_state_on_close() {
        init_logging();
        let dir = tempfile::tempdir().unwrap();
        let context = DirectoryContext::new(dir.path());

        let codec = employee_codec(&context).open().unwrap();
        assert_eq!(codec.registry().len(), 3);
        assert!(!dir.path().join(STATE_FILE_NAME).exists());

        codec.close().unwrap();
        assert!(dir.path().join(STATE_FILE_NAME).exists());
    }

    #[test]
    fn test_records_survive_restart() {
        init_logging();
        let dir = tempfile::tempdir().unwrap();
        let context = DirectoryContext::new(dir.path());

        let codec = employee_codec(&context).open().unwrap();
        let record = codec.encode(&employee()).unwrap();
        codec.close().unwrap();

        let codec = employee_codec(&context).open().unwrap();
        assert_eq!(codec.decode(&record).unwrap(), employee());
        assert!(codec.equals(&employee(), &record).unwrap());
        codec.close().unwrap();
    }

    #[test]
    fn test_restart_keeps_identifiers_when_registration_order_changes() {
        init_logging();
        let dir = tempfile::tempdir().unwrap();
        let context = DirectoryContext::new(dir.path());

        let codec = employee_codec(&context).open().unwrap();
        let record = codec.encode(&employee()).unwrap();
        codec.close().unwrap();

        // A later run registers in another order; restored identifiers win
        let codec = Codec::<Employee>::builder()
            .register::<Description>()
            .register::<Person>()
            .register::<Employee>()
            .persistent(FileStateStore::new(), &context)
            .open()
            .unwrap();

        let registry = codec.registry();
        assert_eq!(
            registry.resolve_type(&Employee::type_descriptor()).unwrap(),
            TypeIdentifier::new(0)
        );
        assert_eq!(
            registry.resolve_type(&Description::type_descriptor()).unwrap(),
            TypeIdentifier::new(2)
        );
        assert_eq!(codec.decode(&record).unwrap(), employee());
        codec.close().unwrap();
    }

    #[test]
    fn test_new_types_continue_after_restored_identifiers() {
        let dir = tempfile::tempdir().unwrap();
        let context = DirectoryContext::new(dir.path());

        Codec::<Person>::builder()
            .register::<Person>()
            .persistent(FileStateStore::new(), &context)
            .open()
            .unwrap()
            .close()
            .unwrap();

        let codec = Codec::<Employee>::builder()
            .register::<Employee>()
            .persistent(FileStateStore::new(), &context)
            .open()
            .unwrap();
        assert_eq!(
            codec.registry().resolve_type(&Employee::type_descriptor()).unwrap(),
            TypeIdentifier::new(1)
        );
        codec.close().unwrap();

        let state = FileStateStore::new().restore(dir.path()).unwrap();
        assert_eq!(state.len(), 2);
        assert_eq!(
            state.get(TypeIdentifier::new(0)),
            Some(&TypeDescriptor::new("Person"))
        );
    }

    #[test]
    fn test_without_persisted_state_old_records_do_not_decode() {
        let written = tempfile::tempdir().unwrap();
        let codec = employee_codec(&DirectoryContext::new(written.path()))
            .open()
            .unwrap();
        let record = codec.encode(&employee()).unwrap();
        codec.close().unwrap();

        // A fresh location has no state: Person now takes identifier 0
        let fresh = tempfile::tempdir().unwrap();
        let codec = Codec::<Employee>::builder()
            .register::<Person>()
            .register::<Employee>()
            .persistent(FileStateStore::new(), &DirectoryContext::new(fresh.path()))
            .open()
            .unwrap();

        assert!(matches!(
            codec.decode(&record),
            Err(DecodingError::TypeMismatch { ref found, .. }) if found.name() == "Person"
        ));
        codec.close().unwrap();
    }

    #[test]
    fn test_truncated_state_fails_open() {
        init_logging();
        let dir = tempfile::tempdir().unwrap();
        let context = DirectoryContext::new(dir.path());

        employee_codec(&context).open().unwrap().close().unwrap();

        let path = dir.path().join(STATE_FILE_NAME);
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        let err = employee_codec(&context).open().unwrap_err();
        assert!(matches!(err, CodecError::Store(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_flipped_byte_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        let context = DirectoryContext::new(dir.path());

        employee_codec(&context).open().unwrap().close().unwrap();

        let path = dir.path().join(STATE_FILE_NAME);
        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        fs::write(&path, &bytes).unwrap();

        let err = Codec::<Employee>::persistent(&context).unwrap_err();
        assert!(matches!(err, CodecError::Store(StoreError::Corrupt { .. })));
    }

    /// Puts a regular file where the state directory should be.
    fn block_location(location: &Path) {
        fs::write(location, b"not a directory").unwrap();
    }

    #[test]
    fn test_persist_failure_is_reported_on_close() {
        init_logging();
        let dir = tempfile::tempdir().unwrap();
        let location = dir.path().join("cache");
        let codec = employee_codec(&DirectoryContext::new(&location))
            .open()
            .unwrap();
        block_location(&location);

        let err = codec.close().unwrap_err();
        assert!(matches!(err, CodecError::Persist(StoreError::Io { .. })));
        assert_eq!(codec.state(), CodecState::Closing);
        assert_eq!(codec.registry().len(), 3);
    }

    #[test]
    fn test_ignored_persist_failure_still_closes() {
        init_logging();
        let dir = tempfile::tempdir().unwrap();
        let location = dir.path().join("cache");
        let codec = employee_codec(&DirectoryContext::new(&location))
            .config(CodecConfig::default().with_persist_failure(PersistFailurePolicy::Ignore))
            .open()
            .unwrap();
        block_location(&location);

        codec.close().unwrap();
        assert_eq!(codec.state(), CodecState::Closed);
        assert!(codec.registry().is_empty());
    }

    #[test]
    fn test_double_close_writes_state_once() {
        let dir = tempfile::tempdir().unwrap();
        let context = DirectoryContext::new(dir.path());

        let codec = employee_codec(&context).open().unwrap();
        codec.close().unwrap();

        let path = dir.path().join(STATE_FILE_NAME);
        fs::remove_file(&path).unwrap();

        codec.close().unwrap();
        assert!(!path.exists(), "second close must not persist again");
    }

    #[test]
    fn test_flush_persists_without_closing() {
        let dir = tempfile::tempdir().unwrap();
        let context = DirectoryContext::new(dir.path());

        let codec = employee_codec(&context).open().unwrap();
        codec.flush().unwrap();

        assert!(dir.path().join(STATE_FILE_NAME).exists());
        assert_eq!(codec.state(), CodecState::Ready);
        assert!(codec.encode(&employee()).is_ok());
        codec.close().unwrap();
    }
}
