/// utility to show a parsed KeePass database
use std::fs::File;

use anyhow::Result;
use clap::Parser;

use kdbx_rs::{db::fields, Database, DatabaseKey, GroupRef};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Provide a .kdbx database
    in_kdbx: String,

    /// Provide a keyfile
    #[arg(short = 'k', long)]
    keyfile: Option<String>,
}

fn print_group(group: &GroupRef<'_>, depth: usize) {
    let indent = "  ".repeat(depth);
    println!("{}[{}]", indent, group.name);

    for entry in group.entries() {
        let title = entry.get_str(fields::TITLE).unwrap_or("(no title)");
        let username = entry.get_str(fields::USERNAME).unwrap_or("");
        println!("{}  - {} ({})", indent, title, username);
    }

    for child in group.groups() {
        print_group(&child, depth + 1);
    }
}

pub fn main() -> Result<()> {
    let args = Args::parse();

    let mut source = File::open(args.in_kdbx)?;
    let mut key = DatabaseKey::new();

    if let Some(f) = args.keyfile {
        key = key.with_keyfile(&mut File::open(f)?)?;
    }

    key = key.with_password_from_prompt("Password (or blank for none): ")?;

    let db = Database::open(&mut source, key)?;

    print_group(&db.root(), 0);

    Ok(())
}
