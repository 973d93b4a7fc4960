//! Equivalent shell command
//!
//! Renders a `sh -c '...'` one-liner that reproduces a preflight with `dig`
//! and `curl`: resolve the new target to its first IPv4 address, request the
//! endpoint normally, request it again with the connection pinned to the new
//! address, then apply the same pass/fail policy as the comparator.

use crate::{
    client::connect::{connect_target, split_host_port},
    error::Result,
    models::Job,
};
use std::net::IpAddr;
use url::Host;

/// Full `sh -c '...'` command for `job`
pub fn equivalent_command(job: &Job) -> Result<String> {
    Ok(format!("sh -c {}", shell_quote(&equivalent_script(job)?)))
}

/// The script run by [`equivalent_command`]
pub fn equivalent_script(job: &Job) -> Result<String> {
    let target = connect_target(job.endpoint())?;
    let (host, port) = split_host_port(&target)?;
    let endpoint = shell_quote(job.endpoint().as_str());
    let timeout = job.timeout().as_secs_f64();
    let request = request_args(job);

    let mut script = String::new();

    script.push_str(&new_ip_assignment(job.new_target()));
    script.push_str(&format!(
        r#"if [ -z "$NEW_IP" ]; then echo {} >&2; exit 1; fi; "#,
        shell_quote(&format!("no IPv4 address found for {}", job.new_target()))
    ));

    script.push_str(&format!(
        r#"ORIG=$(curl -s -o /dev/null -m {} -w "%{{http_code}}"{} {}); "#,
        timeout, request, endpoint
    ));

    // IP-literal endpoints are never resolved by curl, so pin the connection instead
    let pin = match job.endpoint().host() {
        Some(Host::Domain(_)) => format!("--resolve {}\"$NEW_IP\"", shell_quote(&format!("{}:{}:", host, port))),
        _ => format!(
            "--connect-to {}\"$NEW_IP\"{}",
            shell_quote(&format!("{}:{}:", bracket(&host), port)),
            shell_quote(&format!(":{}", port))
        ),
    };
    script.push_str(&format!(
        r#"NEW=$(curl -s -o /dev/null -m {} -w "%{{http_code}}"{} {} {}); "#,
        timeout, request, pin, endpoint
    ));

    let lower_passes = if job.lower_is_better() {
        r#" || [ "$NEW" -lt "$ORIG" ]"#
    } else {
        ""
    };
    script.push_str(&format!(
        r#"if [ "$NEW" -eq "$ORIG" ]{}; then echo passed; else echo "failed - expected: $ORIG, got: $NEW"; exit 1; fi"#,
        lower_passes
    ));

    Ok(script)
}

/// `NEW_IP=...;` mirroring the resolver's special cases
fn new_ip_assignment(target: &str) -> String {
    if target == "localhost" {
        return "NEW_IP=127.0.0.1; ".to_string();
    }
    match target.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => format!("NEW_IP={}; ", ip),
        Ok(IpAddr::V6(ip)) => format!("NEW_IP='[{}]'; ", ip),
        Err(_) => format!(
            "NEW_IP=$(dig +short A {} | grep -E '^[0-9]+(\\.[0-9]+){{3}}$' | head -n1); ",
            shell_quote(target)
        ),
    }
}

/// Method, headers and body, shared by both curl calls
fn request_args(job: &Job) -> String {
    let mut args = format!(" -X {}", shell_quote(job.method().as_str()));
    for (name, value) in job.headers() {
        let header = format!("{}: {}", name.as_str(), String::from_utf8_lossy(value.as_bytes()));
        args.push_str(&format!(" -H {}", shell_quote(&header)));
    }
    if let Some(body) = job.body() {
        args.push_str(&format!(" --data-binary {}", shell_quote(body)));
    }
    args
}

fn bracket(host: &str) -> String {
    if host.contains(':') {
        format!("[{}]", host)
    } else {
        host.to_string()
    }
}

/// Single-quote `value` for POSIX sh
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobSpec;
    use std::time::Duration;

    fn job(spec: JobSpec) -> Job {
        Job::from_spec(&spec).unwrap()
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("plain"), "'plain'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_hostname_target_uses_dig_and_resolve() {
        let script = equivalent_script(&job(JobSpec::new(
            "https://app.example.com/health",
            "new-lb.example.net",
        )))
        .unwrap();

        assert!(script.contains("dig +short A 'new-lb.example.net'"));
        assert!(script.contains(r#"--resolve 'app.example.com:443:'"$NEW_IP""#));
        assert!(script.contains("-m 5 "));
        assert!(script.contains(r#"if [ "$NEW" -eq "$ORIG" ]; then echo passed"#));
        assert!(!script.contains("-lt"));
    }

    #[test]
    fn test_literal_and_localhost_targets_skip_dig() {
        let literal = equivalent_script(&job(JobSpec::new("http://app.example.com:8080/", "203.0.113.5"))).unwrap();
        assert!(literal.starts_with("NEW_IP=203.0.113.5; "));
        assert!(literal.contains("'app.example.com:8080:'"));
        assert!(!literal.contains("dig"));

        let local = equivalent_script(&job(JobSpec::new("http://app.example.com/", "localhost"))).unwrap();
        assert!(local.starts_with("NEW_IP=127.0.0.1; "));
    }

    #[test]
    fn test_both_requests_carry_method_headers_and_body() {
        let spec = JobSpec::new("https://api.example.com/orders", "203.0.113.5")
            .with_method("POST")
            .with_header("Authorization", "Bearer it's-a-token")
            .with_body(r#"{"dry_run":true}"#)
            .with_timeout(Duration::from_millis(1500));
        let script = equivalent_script(&job(spec)).unwrap();

        assert_eq!(script.matches("-X 'POST'").count(), 2);
        assert_eq!(script.matches(r"-H 'authorization: Bearer it'\''s-a-token'").count(), 2);
        assert_eq!(script.matches(r#"--data-binary '{"dry_run":true}'"#).count(), 2);
        assert_eq!(script.matches("-m 1.5 ").count(), 2);
    }

    #[test]
    fn test_lower_is_better_policy() {
        let spec = JobSpec::new("https://app.example.com/", "203.0.113.5").lower_is_better(true);
        let script = equivalent_script(&job(spec)).unwrap();
        assert!(script.contains(r#"if [ "$NEW" -eq "$ORIG" ] || [ "$NEW" -lt "$ORIG" ]; then echo passed"#));
    }

    #[test]
    fn test_ip_literal_endpoint_pins_connection() {
        let script = equivalent_script(&job(JobSpec::new("http://192.0.2.10:8080/", "203.0.113.5"))).unwrap();
        assert!(script.contains(r#"--connect-to '192.0.2.10:8080:'"$NEW_IP"':8080'"#));
        assert!(!script.contains("--resolve"));
    }

    #[test]
    fn test_command_wraps_script_for_sh() {
        let command = equivalent_command(&job(JobSpec::new("https://app.example.com/", "203.0.113.5"))).unwrap();
        assert!(command.starts_with("sh -c '"));
        assert!(command.ends_with("fi'"));
        // Inner single quotes are escaped for the outer quoting
        assert!(command.contains(r"'\''https://app.example.com/'\''"));
    }
}
