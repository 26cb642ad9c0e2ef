//! Encode a heterogeneous map carrying builtin values, a nested map and a
//! session object reference, then decode it again.
//!
//! Run with:
//!   cargo run --example hetero-roundtrip

use std::io::Cursor;
use std::sync::Arc;

use packwire::codec::{
    builtin, HeteroMap, HeteroMapPacker, ObjRef, ObjectTable, Packer, PackerRef,
    TypeRegistry, Value,
};

/// Session type referenced by id rather than by value.
#[derive(Debug)]
struct Account {
    owner: String,
}

const ACCOUNT_REF: i32 = 1000;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let table = Arc::new(ObjectTable::<Account>::new());
    let account_ref: PackerRef = Arc::new(ObjRef::with_table(ACCOUNT_REF, Arc::clone(&table)));

    let registry = Arc::new(TypeRegistry::from_packers([Arc::clone(&account_ref)])?);
    let packer = HeteroMapPacker::new(Arc::clone(&registry));
    let nested: PackerRef = Arc::new(packer.clone());

    let account = Arc::new(Account {
        owner: "agnos".to_string(),
    });

    let mut limits = HeteroMap::new();
    limits.insert("daily", builtin::string(), 500i32, builtin::int32());

    let mut map = HeteroMap::new();
    map.insert(1i32, builtin::int32(), "first", builtin::string());
    map.insert("ratio", builtin::string(), 0.25f64, builtin::float());
    map.insert("limits", builtin::string(), limits, Arc::clone(&nested));
    map.insert(
        "account",
        builtin::string(),
        Value::object(Arc::clone(&account)),
        account_ref,
    );

    let mut wire = Vec::new();
    packer.pack(&map, &mut wire)?;
    eprintln!("encoded {} entries into {} bytes", map.len(), wire.len());

    let decoded = packer.unpack(&mut Cursor::new(wire))?;
    for entry in &decoded {
        eprintln!(
            "{:?} [{}] => {:?} [{}]",
            entry.key,
            entry.key_packer.tag(),
            entry.value,
            entry.value_packer.tag()
        );
    }

    if let Some(Value::Object(obj)) = decoded.get(&Value::from("account")) {
        let resolved = Arc::clone(obj)
            .downcast::<Account>()
            .map_err(|_| "account entry is not an Account")?;
        eprintln!("account resolved to the same object: {}", Arc::ptr_eq(&resolved, &account));
        eprintln!("owner: {}", resolved.owner);
    }

    Ok(())
}
