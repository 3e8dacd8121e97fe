use std::net::Ipv4Addr;

const BACKEND_PORT: &str = "BACKEND_PORT";

const DEFAULT_PORT: u16 = 1234;

pub fn get_port() -> u16 {
    let port_from_env = std::env::var(BACKEND_PORT);
    port_from_env.map_or(DEFAULT_PORT, |res| res.parse().unwrap_or(DEFAULT_PORT))
}

const BACKEND_ADDR: &str = "BACKEND_ADDR";

const DEFAULT_ADDR: Ipv4Addr = Ipv4Addr::new(0, 0, 0, 0);

pub fn get_addr() -> Ipv4Addr {
    let addr_from_env = std::env::var(BACKEND_ADDR);
    addr_from_env.map_or(DEFAULT_ADDR, |res| res.parse().unwrap_or(DEFAULT_ADDR))
}

const BACKEND_OK: &str = "BACKEND_OK";

pub fn get_ok_components() -> Vec<String> {
    components_from_env(BACKEND_OK)
}

const BACKEND_FAILED: &str = "BACKEND_FAILED";

pub fn get_failed_components() -> Vec<String> {
    components_from_env(BACKEND_FAILED)
}

const BACKEND_FATAL: &str = "BACKEND_FATAL";

pub fn get_fatal_components() -> Vec<String> {
    components_from_env(BACKEND_FATAL)
}

fn components_from_env(var: &str) -> Vec<String> {
    let raw = std::env::var(var);
    raw.map_or_else(|_| Vec::new(), |res| parse_components(&res))
}

/// Splits a comma-separated component list, dropping empty entries.
pub fn parse_components(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
