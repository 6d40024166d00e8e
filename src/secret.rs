use secrecy::{ExposeSecret, SecretSlice};
use zeroize::Zeroizing;

/// Password bytes, zeroized when dropped.
pub struct Password {
    inner: SecretSlice<u8>,
}

impl Password {
    pub fn new(password: &[u8]) -> Self {
        Self { inner: SecretSlice::from(password.to_vec()) }
    }

    pub fn from_string(password: String) -> Self {
        Self { inner: SecretSlice::from(password.into_bytes()) }
    }

    pub fn expose_secret(&self) -> &[u8] {
        self.inner.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.expose_secret().is_empty()
    }
}

impl From<&str> for Password {
    fn from(password: &str) -> Self {
        Self::new(password.as_bytes())
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

/// Raw key-file bytes, zeroized when dropped.
pub struct KeyMaterial {
    inner: Zeroizing<Vec<u8>>,
}

impl KeyMaterial {
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { inner: Zeroizing::new(data) }
    }

    pub fn expose_secret(&self) -> &[u8] {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyMaterial([... {} bytes ...])", self.inner.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_does_not_leak() {
        let password = Password::from("hunter2-hunter2");
        assert!(!format!("{password:?}").contains("hunter2"));

        let material = KeyMaterial::from_vec(vec![0xAB; 4]);
        assert_eq!(format!("{material:?}"), "KeyMaterial([... 4 bytes ...])");
    }

    #[test]
    fn test_empty_password() {
        assert!(Password::new(b"").is_empty());
        assert!(!Password::from_string("x".to_owned()).is_empty());
    }
}
