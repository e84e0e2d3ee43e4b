//! Builtin reconnaissance tools
//!
//! `subfinder` enumerates subdomains passively; `httpx` probes the hosts it
//! found and `katana` crawls whatever `httpx` saw answering. `wafw00f` and
//! `sslscan` look at the target directly.

use crate::builtin;
use crate::plugin::builtin::external::ToolSpec;
use crate::plugin::dependency::Dependency;
use crate::plugin::types::ScanType;

pub fn subfinder() -> ToolSpec {
    ToolSpec::new("subfinder", "subfinder", ScanType::Passive)
        .with_args(["-d", "{target}", "-silent"])
        .with_priority(10)
        .with_timeout(600)
        .with_description("Passive subdomain enumeration")
}

pub fn httpx() -> ToolSpec {
    ToolSpec::new("httpx", "httpx", ScanType::Active)
        .with_args(["-l", "{output_dir}/subfinder.txt", "-silent", "-no-color"])
        .with_priority(20)
        .with_timeout(900)
        .depends_on(Dependency::succeeded("subfinder"))
        .with_description("Probe discovered hosts for live HTTP services")
}

pub fn wafw00f() -> ToolSpec {
    ToolSpec::new("wafw00f", "wafw00f", ScanType::Active)
        .with_args(["{target}"])
        .with_priority(30)
        .with_timeout(300)
        .with_description("Detect web application firewalls")
}

pub fn sslscan() -> ToolSpec {
    ToolSpec::new("sslscan", "sslscan", ScanType::Active)
        .with_args(["--no-colour", "{target}"])
        .with_priority(40)
        .with_timeout(300)
        .with_description("Enumerate TLS protocols and cipher suites")
}

pub fn katana() -> ToolSpec {
    ToolSpec::new("katana", "katana", ScanType::Active)
        .with_args(["-list", "{output_dir}/httpx.txt", "-silent", "-depth", "2"])
        .with_priority(50)
        .with_timeout(1200)
        .depends_on(Dependency::completed("httpx"))
        .with_description("Crawl live web services for endpoints")
}

builtin!(|| subfinder().into_descriptor());
builtin!(|| httpx().into_descriptor());
builtin!(|| wafw00f().into_descriptor());
builtin!(|| sslscan().into_descriptor());
builtin!(|| katana().into_descriptor());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_specs_are_valid() {
        for spec in [subfinder(), httpx(), wafw00f(), sslscan(), katana()] {
            spec.validate()
                .unwrap_or_else(|e| panic!("{} is invalid: {}", spec.name, e));
        }
    }

    #[test]
    fn test_chain_dependencies() {
        assert!(subfinder().depends_on.is_empty());
        assert_eq!(httpx().depends_on, vec![Dependency::succeeded("subfinder")]);
        assert_eq!(katana().depends_on, vec![Dependency::completed("httpx")]);
        assert_eq!(subfinder().scan_type, ScanType::Passive);
        assert_eq!(katana().scan_type, ScanType::Active);
    }
}
