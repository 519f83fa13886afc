//! TLS client configuration for STARTTLS.

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::sync::Arc;
use tokio_rustls::TlsConnector;
use tracing::warn;

/// How the server certificate is checked during the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsPolicy {
    /// Verify the chain against the webpki roots and match the hostname.
    Verify,
    /// Accept any certificate. Needed for internal relays with self-signed
    /// certificates; the channel is still encrypted.
    #[default]
    AcceptInvalidCerts,
}

/// Creates a TLS connector for the given policy.
pub(crate) fn create_tls_connector(policy: TlsPolicy) -> TlsConnector {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let mut config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    if policy == TlsPolicy::AcceptInvalidCerts {
        warn!("TLS certificate verification disabled");
        config
            .dangerous()
            .set_certificate_verifier(Arc::new(AcceptAnyCert));
    }

    TlsConnector::from(Arc::new(config))
}

#[derive(Debug)]
struct AcceptAnyCert;

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::ED25519,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_accepts_invalid_certs() {
        assert_eq!(TlsPolicy::default(), TlsPolicy::AcceptInvalidCerts);
    }

    #[test]
    fn relaxed_verifier_accepts_anything() {
        let verifier = AcceptAnyCert;
        let cert = CertificateDer::from(vec![0u8; 4]);
        let name = ServerName::try_from("relay.internal").map(|n| n.to_owned());
        assert!(name.is_ok());
        if let Ok(name) = name {
            assert!(
                verifier
                    .verify_server_cert(&cert, &[], &name, &[], UnixTime::now())
                    .is_ok()
            );
        }
        assert!(!verifier.supported_verify_schemes().is_empty());
    }
}
