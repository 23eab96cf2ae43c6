//! Operator guidance text and zip packaging for certificate exports.

use std::io::{Cursor, Write};
use std::path::Path;

use certcenter_core::models::certificate::CertificateClass;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::PkiError;
use crate::layout::CertificateArtifacts;

pub const README_NAME: &str = "readme.txt";

/// How file names appear in the guidance text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileNaming {
    /// Absolute paths on the CA host (detail view).
    FullPath,
    /// Bare file names, as laid out inside the export archive.
    BaseName,
}

fn display_name(path: &Path, naming: FileNaming) -> String {
    match naming {
        FileNaming::FullPath => path.display().to_string(),
        FileNaming::BaseName => file_name(path),
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Human-readable instructions naming the exact files of a certificate.
pub fn guidance(artifacts: &CertificateArtifacts, naming: FileNaming) -> String {
    let cert = display_name(&artifacts.certificate, naming);
    let key = display_name(&artifacts.private_key, naming);
    let chain = display_name(&artifacts.chain, naming);

    match artifacts.class {
        CertificateClass::Server => {
            let crl = display_name(&artifacts.crl, naming);
            format!(
                "Server certificate\n\
                 \n\
                 Certificate:          {cert}\n\
                 Private key:          {key}\n\
                 CA chain:             {chain}\n\
                 Revocation list:      {crl}\n\
                 \n\
                 Install the certificate and private key on the server. To require\n\
                 client certificates, trust the CA chain and check the revocation list:\n\
                 \n\
                 nginx:\n\
                 \x20   ssl_certificate         {cert};\n\
                 \x20   ssl_certificate_key     {key};\n\
                 \x20   ssl_client_certificate  {chain};\n\
                 \x20   ssl_crl                 {crl};\n\
                 \x20   ssl_verify_client       on;\n"
            )
        }
        CertificateClass::Client => format!(
            "Client certificate\n\
             \n\
             Certificate:          {cert}\n\
             Private key:          {key}\n\
             CA chain:             {chain}\n\
             \n\
             Present the certificate and private key when connecting, and verify\n\
             the server against the CA chain:\n\
             \n\
             curl --cert {cert} --key {key} --cacert {chain} https://<server>/\n"
        ),
    }
}

/// Build a zip archive from `(entry name, contents)` pairs plus a readme.
pub fn package(entries: &[(String, Vec<u8>)], readme: &str) -> Result<Vec<u8>, PkiError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, contents) in entries {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(contents)?;
    }
    zip.start_file(README_NAME, options)?;
    zip.write_all(readme.as_bytes())?;

    Ok(zip.finish()?.into_inner())
}
