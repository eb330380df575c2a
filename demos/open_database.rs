use std::fs::File;

use kdbx_rs::{db::fields, Database, DatabaseKey};

fn main() -> Result<(), kdbx_rs::Error> {
    // Open a KeePass database using a password (a keyfile is also supported via
    // `DatabaseKey::with_keyfile`)
    let mut file = File::open("tests/resources/test_db_with_password.kdbx")?;
    let key = DatabaseKey::new().with_password("demopass");
    let db = Database::open(&mut file, key)?;

    // Recursively walk every entry in the database, regardless of which group it lives in.
    for entry in db.root().entries_recursive() {
        let title = entry.get_str(fields::TITLE).unwrap_or("(no title)");
        let user = entry.get_str(fields::USERNAME).unwrap_or("(no username)");
        let pass = entry.get_str(fields::PASSWORD).unwrap_or("(no password)");
        println!("Entry '{title}': '{user}' : '{pass}'");
    }

    Ok(())
}
