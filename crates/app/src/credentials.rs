//! The login token kept between runs.

use std::{fs, io::ErrorKind, path::Path};

use client::Credential;

use crate::error::Result;

pub fn load(path: &str) -> Result<Option<Credential>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    Ok(Some(serde_json::from_str(&content)?))
}

/// Writes the credential, or removes the file once the session is gone.
pub fn sync(path: &str, credential: Option<&Credential>) -> Result<()> {
    let Some(credential) = credential else {
        return match fs::remove_file(path) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        };
    };

    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(credential)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path() -> String {
        std::env::temp_dir()
            .join(format!("nexkontrol_{}", uuid::Uuid::new_v4()))
            .join("credentials.json")
            .display()
            .to_string()
    }

    #[test]
    fn missing_file_means_no_session() {
        assert_eq!(load(&scratch_path()).unwrap(), None);
    }

    #[test]
    fn credential_survives_a_restart_until_the_session_ends() {
        let path = scratch_path();
        let credential = Credential {
            token: "abc".to_string(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
        };

        sync(&path, Some(&credential)).unwrap();
        assert_eq!(load(&path).unwrap(), Some(credential));

        sync(&path, None).unwrap();
        assert_eq!(load(&path).unwrap(), None);
        sync(&path, None).unwrap();
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let path = scratch_path();
        fs::create_dir_all(Path::new(&path).parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();
        assert!(load(&path).is_err());
    }
}
