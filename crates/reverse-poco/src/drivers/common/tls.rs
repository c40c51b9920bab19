//! PostgreSQL `sslmode` handling.
//!
//! Metadata reads only need server authentication, so client certificates
//! are never configured. `verify-ca` is treated like `verify-full` because
//! rustls always checks the host name.

use std::str::FromStr;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{self, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tokio_postgres_rustls::MakeRustlsConnect;
use tracing::{debug, warn};

use crate::error::{GenError, Result};

/// Value of `connection.ssl_mode` for PostgreSQL sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    /// Plain TCP.
    #[default]
    Disable,
    /// Encrypted, server certificate not checked.
    Require,
    VerifyCa,
    VerifyFull,
}

impl FromStr for SslMode {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "disable" => Ok(Self::Disable),
            "require" => Ok(Self::Require),
            "verify-ca" => Ok(Self::VerifyCa),
            "verify-full" => Ok(Self::VerifyFull),
            other => Err(GenError::Config(format!(
                "connection.ssl_mode '{}' is not one of disable, require, verify-ca, verify-full",
                other
            ))),
        }
    }
}

impl SslMode {
    pub fn is_encrypted(self) -> bool {
        self != Self::Disable
    }

    /// Connector for `deadpool_postgres::Manager`, or `None` for plain TCP.
    pub fn connector(self) -> Result<Option<MakeRustlsConnect>> {
        if !self.is_encrypted() {
            return Ok(None);
        }
        Ok(Some(MakeRustlsConnect::new(self.client_config()?)))
    }

    fn client_config(self) -> Result<ClientConfig> {
        let provider = Arc::new(crypto::ring::default_provider());
        let builder = ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()
            .map_err(|e| GenError::Config(format!("TLS setup failed: {}", e)))?;

        let config = if self == Self::Require {
            warn!("ssl_mode=require: the PostgreSQL server certificate is not verified");
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(UnverifiedServer { provider }))
                .with_no_client_auth()
        } else {
            debug!("ssl_mode={:?}: verifying against webpki roots", self);
            let roots = RootCertStore {
                roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
            };
            builder.with_root_certificates(roots).with_no_client_auth()
        };
        Ok(config)
    }
}

/// Skips chain and name checks but still validates handshake signatures.
#[derive(Debug)]
struct UnverifiedServer {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for UnverifiedServer {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
