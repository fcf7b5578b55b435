use bodywork_config::secrets;

fn main() {
    match secrets::generate_key() {
        Ok(key) => {
            println!("{key}");
            eprintln!("Set PII_ENCRYPTION_KEY to this value and keep it out of version control.");
            eprintln!("Rotating the key makes previously stored client details unreadable.");
        }
        Err(err) => {
            eprintln!("Error generating key: {}", err);
            std::process::exit(1);
        }
    }
}
