use std::str::FromStr;

pub fn env_var_truthy(name: &str) -> bool {
    match std::env::var(name) {
        Ok(v) => {
            let v = v.to_ascii_lowercase();
            v == "1" || v == "true" || v == "yes" || v == "on"
        }
        Err(_) => false,
    }
}

pub fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse::<T>().ok())
}

pub fn default_threads() -> usize { num_cpus::get().max(1) }

pub fn div_ceil(a: usize, b: usize) -> usize { if a == 0 { 0 } else { (a - 1) / b + 1 } }
