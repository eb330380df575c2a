#![cfg(all(target_arch = "wasm32", feature = "save_kdbx4"))]

use kdbx_rs::{db::fields, Database, DatabaseKey};
use wasm_bindgen_test::wasm_bindgen_test;

/// Ensure that writing and reading back an Argon2-encrypted KDBX4 database does not panic
/// when running inside a wasm32 runtime (regression test for the "support wasm" change).
#[wasm_bindgen_test]
fn open_kdbx4_argon2_in_wasm_does_not_panic() {
    // The default database config uses Argon2; historically, multithreaded Argon2 could cause
    // panics on wasm targets without thread support. This test exercises that configuration
    // end-to-end without relying on a checked-in binary fixture.
    let mut db = Database::new();
    db.root_mut().create_entry().set_unprotected(fields::TITLE, "wasm entry");

    let key = DatabaseKey::new().with_password("demopass");

    let mut buf = Vec::new();
    db.save(&mut buf, key.clone())
        .expect("database should save successfully in wasm without panicking");

    let opened = Database::parse(&buf, key).expect("database should open successfully in wasm without panicking");

    assert_eq!(opened.root().name, "Root");
    assert_eq!(
        opened.root().entries().next().and_then(|e| e.get_str(fields::TITLE).map(str::to_owned)),
        Some("wasm entry".to_string())
    );
}
