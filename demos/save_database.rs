use std::fs::File;

use kdbx_rs::{db::fields, Database, DatabaseKey};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::new();

    db.meta.database_name = Some("Demo database".to_string());

    let mut root = db.root_mut();
    let mut group = root.create_group("Demo group");

    let mut entry = group.create_entry();
    entry.set_unprotected(fields::TITLE, "Demo entry");
    entry.set_unprotected(fields::USERNAME, "jdoe");
    entry.set_protected(fields::PASSWORD, "hunter2");

    drop(entry);
    drop(group);
    drop(root);

    db.save(&mut File::create("demo.kdbx")?, DatabaseKey::new().with_password("demopass"))?;

    Ok(())
}
