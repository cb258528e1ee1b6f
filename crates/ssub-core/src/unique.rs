//! Seed token that keeps job names and log files from colliding.

use crate::params::ParameterSet;
use camino::Utf8PathBuf;
use rand::Rng;

/// Length of a generated seed.
pub const SEED_LEN: usize = 10;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate a random alphabetic seed of [`SEED_LEN`] characters.
pub fn generate_seed() -> String {
    let mut rng = rand::rng();
    (0..SEED_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Append the seed to the job name and both log paths.
///
/// Does nothing when `no_unique` is set. In paths the seed goes before the
/// last `.` so the extension survives.
pub fn uniquify(params: &mut ParameterSet) {
    if params.no_unique {
        return;
    }

    let seed = params.seed.clone();
    params.job_name = format!("{}_{}", params.job_name, seed);
    params.logs.output = insert_seed(params.logs.output.as_str(), &seed);
    params.logs.error = insert_seed(params.logs.error.as_str(), &seed);
}

fn insert_seed(path: &str, seed: &str) -> Utf8PathBuf {
    match path.rfind('.') {
        Some(dot) => format!("{}_{}{}", &path[..dot], seed, &path[dot..]).into(),
        None => format!("{path}_{seed}").into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::LogPaths;

    fn params_with(job_name: &str, output: &str, error: &str) -> ParameterSet {
        ParameterSet {
            job_name: job_name.to_string(),
            seed: "abcDEF1234".to_string(),
            logs: LogPaths {
                output: output.into(),
                error: error.into(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_generate_seed() {
        let seed = generate_seed();
        assert_eq!(seed.len(), SEED_LEN);
        assert!(seed.chars().all(|c| c.is_ascii_alphabetic()));
    }

    #[test]
    fn test_uniquify_preserves_extension() {
        let mut params = params_with("foo", "foo.log", "foo.log");
        uniquify(&mut params);
        assert_eq!(params.job_name, "foo_abcDEF1234");
        assert_eq!(params.logs.output, Utf8PathBuf::from("foo_abcDEF1234.log"));
        assert_eq!(params.logs.error, Utf8PathBuf::from("foo_abcDEF1234.log"));
    }

    #[test]
    fn test_uniquify_split_paths() {
        let mut params = params_with("foo", "/logs/foo.out", "/logs/foo.err");
        uniquify(&mut params);
        assert_eq!(
            params.logs.output,
            Utf8PathBuf::from("/logs/foo_abcDEF1234.out")
        );
        assert_eq!(
            params.logs.error,
            Utf8PathBuf::from("/logs/foo_abcDEF1234.err")
        );
    }

    #[test]
    fn test_uniquify_without_dot_appends() {
        let mut params = params_with("foo", "/logs/stdout", "/logs/stderr");
        uniquify(&mut params);
        assert_eq!(params.logs.output, Utf8PathBuf::from("/logs/stdout_abcDEF1234"));
    }

    #[test]
    fn test_uniquify_uses_last_dot_anywhere() {
        let mut params = params_with("foo", "/data/run.v2/stdout", "/data/run.v2/stdout");
        uniquify(&mut params);
        assert_eq!(
            params.logs.output,
            Utf8PathBuf::from("/data/run_abcDEF1234.v2/stdout")
        );
    }

    #[test]
    fn test_no_unique_leaves_everything() {
        let mut params = params_with("foo", "foo.log", "foo.log");
        params.no_unique = true;
        let before = params.clone();
        uniquify(&mut params);
        assert_eq!(params, before);
    }
}
