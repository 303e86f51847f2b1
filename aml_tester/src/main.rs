/*
 * This is a small program for testing the parser and generator on real tables.
 * It scans a directory for AML files (e.g. compiled with `iasl` or dumped from
 * firmware), parses each one, optionally prints the resulting tree layout, and
 * checks that the parsed tree regenerates the input bytes, printing a summary
 * table like `cargo test` does.
 */

use amltree::{parse_table, print_layout, tree_to_bytes, Context};
use clap::{App, Arg};
use std::{ffi::OsStr, fs, path::Path, process};

fn main() {
    let matches = App::new("aml_tester")
        .version("v0.1.0")
        .about("Parses AML files and verifies they regenerate")
        .arg(Arg::with_name("path").short("p").long("path").required(true).takes_value(true))
        .arg(Arg::with_name("print").long("print").help("Print the parsed layout of each table"))
        .get_matches();

    let dir_path = Path::new(matches.value_of("path").unwrap());
    println!("Running tests in directory: {:?}", dir_path);

    let (passed, failed) = run_tests(dir_path, matches.is_present("print")).unwrap();
    println!("Test results: {} passed, {} failed", passed, failed);
    if failed > 0 {
        process::exit(1);
    }
}

fn run_tests(dir_path: &Path, print: bool) -> std::io::Result<(u32, u32)> {
    let aml_files = fs::read_dir(dir_path)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension() == Some(OsStr::new("aml")));

    let mut passed = 0;
    let mut failed = 0;
    for file in aml_files {
        let file_name = file.path().file_name().and_then(OsStr::to_str).unwrap_or("?").to_owned();
        let table = fs::read(file.path())?;

        match test_table(&table, print) {
            Ok(()) => {
                println!("Test passed: {}", file_name);
                passed += 1;
            }
            Err(reason) => {
                println!("Test failed: {}: {}", file_name, reason);
                failed += 1;
            }
        }
    }

    Ok((passed, failed))
}

fn test_table(table: &[u8], print: bool) -> Result<(), String> {
    let mut context = Context::new();
    let tree = parse_table(&mut context, table).map_err(|err| format!("parse error: {:?}", err))?;

    if print {
        let mut rendered = String::new();
        print_layout(&tree, &mut rendered).map_err(|err| format!("print error: {:?}", err))?;
        println!("{}", rendered);
    }

    /*
     * Regeneration only matches byte-for-byte when the compiler emitted
     * minimal-width package lengths, which iasl does; a length difference is
     * reported distinctly from a content difference.
     */
    let generated = tree_to_bytes(&tree).map_err(|err| format!("generate error: {:?}", err))?;
    if generated.len() != table.len() {
        return Err(format!("regenerated {} bytes, expected {}", generated.len(), table.len()));
    }
    if generated != table {
        let at = generated.iter().zip(table).position(|(a, b)| a != b).unwrap_or(0);
        return Err(format!("regenerated table differs at offset {:#x}", at));
    }

    Ok(())
}
