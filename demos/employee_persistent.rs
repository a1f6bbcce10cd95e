use serde::{Deserialize, Serialize};
use serialito::{
    Codec, CodecBuilder, DirectoryContext, FileStateStore, Registered, STATE_FILE_NAME,
};
use std::collections::HashMap;
use std::error::Error;

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

/// Codec for the employee cache, with the sample types registered in a fixed order
fn employee_codec(context: &DirectoryContext) -> CodecBuilder<Employee> {
    Codec::<Employee>::builder()
        .register::<Employee>()
        .register::<Person>()
        .register::<Description>()
        .persistent(FileStateStore::new(), context)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    println!("\n=== Persistent Employee Codec ===\n");

    let dir = tempfile::tempdir()?;
    let context = DirectoryContext::new(dir.path().join("employee-cache"));

    // Stand-in for an off-heap cache: key -> encoded record
    let mut cache: HashMap<u64, Vec<u8>> = HashMap::new();

    println!("--- Run 1: first start, no registry state yet ---\n");
    let codec = employee_codec(&context).open()?;
    println!("Registered types: {}", codec.registry().len());

    let employee = Employee {
        id: 1234,
        name: "foo".to_string(),
        age: 23,
        description: Description {
            alias: "bar".to_string(),
            code: 879,
        },
    };
    let record = codec.encode(&employee)?;
    println!("Encoded employee {} into {} bytes", employee.id, record.len());
    cache.insert(employee.id, record.into_bytes());

    codec.close()?;
    println!(
        "Closed; registry state written to {}\n",
        context.directory().join(STATE_FILE_NAME).display()
    );

    println!("--- Run 2: restart with the same persistence directory ---\n");
    let codec = employee_codec(&context).open()?;
    println!("Restored types: {}", codec.registry().len());

    if let Some(bytes) = cache.get(&1234) {
        let restored = codec.decode(bytes)?;
        println!("Decoded employee: {:?}", restored);
        assert_eq!(restored, employee);
        assert!(codec.equals(&employee, bytes)?);
    }

    #[cfg(feature = "stats")]
    println!(
        "\nCodec stats: {} encodes, {} decodes, {} decode failures",
        codec.stats().encodes(),
        codec.stats().decodes(),
        codec.stats().decode_failures()
    );

    codec.close()?;
    println!("\n✅ Records written before the restart decoded correctly");

    Ok(())
}
