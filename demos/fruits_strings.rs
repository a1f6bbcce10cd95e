use serialito::{Codec, DirectoryContext, PlainCodec, ValueCodec};
use std::collections::HashMap;
use std::error::Error;

const FRUITS: [&str; 4] = ["apple", "banana", "cherry", "durian"];

/// Fills a byte cache with fruit names through any codec
fn fill(codec: &dyn ValueCodec<String>) -> Result<HashMap<usize, Vec<u8>>, Box<dyn Error>> {
    let mut cache = HashMap::new();
    for (key, fruit) in FRUITS.iter().enumerate() {
        let record = codec.encode(&fruit.to_string())?;
        cache.insert(key, record.into_bytes());
    }
    Ok(cache)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    println!("\n=== Fruit Caches with String Codecs ===\n");

    println!("--- Plain codec (no type tag) ---");
    let plain = PlainCodec::<String>::new();
    let plain_cache = fill(&plain)?;
    println!("banana takes {} bytes", plain_cache[&1].len());

    println!("\n--- Transient registration-aware codec ---");
    let transient = Codec::<String>::transient()?;
    let transient_cache = fill(&transient)?;
    println!("banana takes {} bytes", transient_cache[&1].len());
    println!("cherry? {}", transient.equals(&"cherry".to_string(), &transient_cache[&2])?);
    transient.close()?;

    println!("\n--- Persistent codec across a cache manager restart ---");
    let dir = tempfile::tempdir()?;
    let context = DirectoryContext::new(dir.path().join("fruits"));

    let codec = Codec::<String>::persistent(&context)?;
    let cache = fill(&codec)?;
    codec.close()?;
    println!("First cache manager closed");

    let codec = Codec::<String>::persistent(&context)?;
    for (key, fruit) in FRUITS.iter().enumerate() {
        let value = codec.decode(&cache[&key])?;
        println!("  {} -> {}", key, value);
        assert_eq!(&value, fruit);
    }
    codec.close()?;

    println!("\n✅ All fruits decoded after restart");
    Ok(())
}
