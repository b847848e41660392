use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use sha2::Digest;

/// Characters allowed in a PKCE code verifier.
const UNRESERVED: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// Secret proving that whoever redeems an authorization code is who asked for it.
///
/// See: https://datatracker.ietf.org/doc/html/rfc7636
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub(crate) struct CodeVerifier<const LENGTH: usize> {
    code_verifier: String,
}

impl<const LENGTH: usize> CodeVerifier<LENGTH> {
    pub(crate) fn generate() -> Self {
        const { assert!(LENGTH >= 43 && LENGTH <= 128, "Invalid code verifier length") };

        let mut rng = rand::rng();
        let code_verifier = (0..LENGTH)
            .map(|_| UNRESERVED[rng.random_range(0..UNRESERVED.len())] as char)
            .collect::<String>();

        Self { code_verifier }
    }

    pub(crate) fn to_code_challenge(&self) -> CodeChallenge {
        let digest = sha2::Sha256::digest(self.code_verifier.as_bytes());
        CodeChallenge {
            code_challenge: URL_SAFE_NO_PAD.encode(digest),
            code_challenge_method: CodeChallengeMethod::S256,
        }
    }

    pub(crate) fn code_verifier(&self) -> &str {
        self.code_verifier.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CodeChallengeMethod {
    S256,
}

impl CodeChallengeMethod {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            CodeChallengeMethod::S256 => "S256",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CodeChallenge {
    code_challenge: String,
    code_challenge_method: CodeChallengeMethod,
}

impl CodeChallenge {
    pub(crate) fn code_challenge(&self) -> &str {
        self.code_challenge.as_str()
    }

    pub(crate) fn code_challenge_method(&self) -> CodeChallengeMethod {
        self.code_challenge_method
    }
}
