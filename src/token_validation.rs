use crate::token_claims::{StandardIdTokenClaims, UserRecord};
use snafu::{OptionExt, ResultExt, Snafu};

#[derive(Debug, Clone, PartialEq, Snafu)]
pub enum JwtValidationError {
    #[snafu(display(
        "JwtValidationError: Could not decode JWT header. Input may have the wrong format"
    ))]
    DecodeHeader { source: jsonwebtoken::errors::Error },

    #[snafu(display(
        "JwtValidationError: Could not find a JWK which would match the tokens 'kid': {token_kid:?}"
    ))]
    NoMatchingJwk { token_kid: Option<String> },

    #[snafu(display("JwtValidationError: Could not construct DecodingKey from JWK"))]
    JwkToDecodingKey { source: jsonwebtoken::errors::Error },

    #[snafu(display("JwtValidationError: Could not decode JWT"))]
    Decode { source: jsonwebtoken::errors::Error },
}

#[derive(Debug, Clone, PartialEq, Snafu)]
pub enum IdTokenError {
    #[snafu(display("IdTokenError: No token"))]
    NoToken,

    #[snafu(display("IdTokenError: No JWK set"))]
    NoJwkSet,

    #[snafu(display("IdTokenError: Token is invalid"))]
    Invalid { source: JwtValidationError },
}

/// Checks signature, audience, issuer and expiry of `id_token`.
pub(crate) fn validate(
    id_token: Option<&str>,
    jwk_set: Option<&jsonwebtoken::jwk::JwkSet>,
    expected_audience: &str,
    expected_issuer: &str,
) -> Result<UserRecord, IdTokenError> {
    let id_token = id_token.context(NoTokenSnafu {})?;
    let jwk_set = jwk_set.context(NoJwkSetSnafu {})?;

    let claims = decode_and_validate(id_token, jwk_set, expected_audience, expected_issuer)
        .context(InvalidSnafu {})?;

    Ok(UserRecord::from(claims))
}

fn decode_and_validate(
    token: &str,
    jwk_set: &jsonwebtoken::jwk::JwkSet,
    expected_audience: &str,
    expected_issuer: &str,
) -> Result<StandardIdTokenClaims, JwtValidationError> {
    let jwt_header = jsonwebtoken::decode_header(token).context(DecodeHeaderSnafu {})?;

    tracing::trace!(?jwt_header, "Decoded JWT header");

    let mut validation = jsonwebtoken::Validation::new(jwt_header.alg);
    validation.set_audience(&[expected_audience]);
    validation.set_issuer(&[expected_issuer]);

    let jwk = jwk_set
        .keys
        .iter()
        .find(|it| it.common.key_id == jwt_header.kid)
        .ok_or_else(|| {
            NoMatchingJwkSnafu {
                token_kid: jwt_header.kid,
            }
            .build()
        })?;

    let decoding_key =
        jsonwebtoken::DecodingKey::from_jwk(jwk).context(JwkToDecodingKeySnafu {})?;

    let token_data =
        jsonwebtoken::decode::<StandardIdTokenClaims>(token, &decoding_key, &validation)
            .context(DecodeSnafu {})?;

    Ok(token_data.claims)
}
