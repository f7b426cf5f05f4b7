use std::env;
use std::fs;
use std::path::Path;

/// Prefijo de las variables que el widget lee con `option_env!`
const PREFIX: &str = "MAP_WIDGET_";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.env");

    let env_file = Path::new(".env");
    let Ok(contents) = fs::read_to_string(env_file) else {
        // Sin .env: la API key y el idioma quedan vacíos / por defecto
        return;
    };

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim().trim_matches('"');

        // Solo claves del widget, y sin pisar variables ya exportadas
        if key.starts_with(PREFIX) && env::var(key).is_err() {
            println!("cargo:rustc-env={}={}", key, value);
        }
    }
}
