use std::{path::Path, sync::Arc};

use ::tracing::{info, warn};
use anyhow::{Result, anyhow};
use axum_server::tls_rustls::RustlsConfig;
use rustls::ServerConfig;
use rustls_pki_types::{CertificateDer, PrivateKeyDer, pem::SliceIter};

use crate::config::TlsConfig;

/// Load the certificate chain and its key once, at startup.
/// The files are not watched, rotating them requires a restart.
pub(crate) async fn load_tls_config(tls_config: &TlsConfig) -> Result<RustlsConfig> {
    let (certs, key) = load_server_cert_and_key(&tls_config.cert_file, &tls_config.key_file)
        .await
        .map_err(|e| {
            anyhow!(
                "cannot load TLS material from {:?} and {:?}: {e}",
                tls_config.cert_file,
                tls_config.key_file
            )
        })?;
    info!(
        certificates = certs.len(),
        cert_file = ?tls_config.cert_file,
        "loaded TLS certificate"
    );

    let server_config = build_tls_server_config(certs, key)?;
    Ok(RustlsConfig::from_config(Arc::new(server_config)))
}

// Build the TLS server
fn build_tls_server_config(
    cert: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
) -> Result<ServerConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    Ok(ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(cert, key)?)
}

// Load the server certificate chain and key
async fn load_server_cert_and_key(
    cert_file: &Path,
    key_file: &Path,
) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)> {
    let cert_contents = tokio::fs::read(cert_file).await?;
    let key_contents = tokio::fs::read(key_file).await?;

    let cert_iterator: SliceIter<CertificateDer> = SliceIter::new(&cert_contents[..]);
    let certs: Vec<CertificateDer<'static>> = cert_iterator
        .filter_map(|it| {
            if let Err(ref e) = it {
                warn!("Cannot parse certificate: {e}");
            }
            it.ok()
        })
        .collect();

    if certs.is_empty() {
        return Err(anyhow!("No certificate found in certificate file"));
    }

    let key_iterator: SliceIter<PrivateKeyDer> = SliceIter::new(&key_contents[..]);
    let mut keys: Vec<PrivateKeyDer<'static>> = key_iterator
        .filter_map(|it| {
            if let Err(ref e) = it {
                warn!("Cannot parse private key: {e}");
            }
            it.ok()
        })
        .collect();

    if keys.len() != 1 {
        return Err(anyhow!(
            "Expected exactly one key in key file, found {}",
            keys.len()
        ));
    }

    Ok((certs, keys.remove(0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::{CertificateParams, KeyPair};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn self_signed() -> (String, String) {
        let key_pair = KeyPair::generate().unwrap();
        let cert = CertificateParams::new(vec!["admission-webhook.default.svc".to_string()])
            .unwrap()
            .self_signed(&key_pair)
            .unwrap();
        (cert.pem(), key_pair.serialize_pem())
    }

    #[tokio::test]
    async fn load_valid_certificate() {
        let (cert_pem, key_pem) = self_signed();
        let cert_file = write_temp(&cert_pem);
        let key_file = write_temp(&key_pem);

        let tls_config = TlsConfig {
            cert_file: cert_file.path().to_path_buf(),
            key_file: key_file.path().to_path_buf(),
        };

        assert!(load_tls_config(&tls_config).await.is_ok());
    }

    #[tokio::test]
    async fn load_certificate_chain() {
        let (leaf_pem, key_pem) = self_signed();
        let (other_pem, _) = self_signed();
        let cert_file = write_temp(&format!("{leaf_pem}{other_pem}"));
        let key_file = write_temp(&key_pem);

        let (certs, _) = load_server_cert_and_key(cert_file.path(), key_file.path())
            .await
            .unwrap();
        assert_eq!(certs.len(), 2);
    }

    #[tokio::test]
    async fn missing_files_are_reported() {
        let tls_config = TlsConfig {
            cert_file: "/does/not/exist/tls.crt".into(),
            key_file: "/does/not/exist/tls.key".into(),
        };

        let error = load_tls_config(&tls_config).await.unwrap_err();
        assert!(error.to_string().contains("cannot load TLS material"));
    }

    #[tokio::test]
    async fn key_file_without_keys() {
        let (cert_pem, _) = self_signed();
        let cert_file = write_temp(&cert_pem);
        let key_file = write_temp(&cert_pem);

        let error = load_server_cert_and_key(cert_file.path(), key_file.path())
            .await
            .unwrap_err();
        assert!(error.to_string().contains("exactly one key"));
    }

    #[tokio::test]
    async fn cert_file_without_certificates() {
        let (_, key_pem) = self_signed();
        let cert_file = write_temp(&key_pem);
        let key_file = write_temp(&key_pem);

        let error = load_server_cert_and_key(cert_file.path(), key_file.path())
            .await
            .unwrap_err();
        assert!(error.to_string().contains("No certificate"));
    }
}
