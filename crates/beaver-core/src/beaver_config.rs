//! The beaver INI configuration file

use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use ini::{EscapePolicy, Ini, ParseOption, WriteOption};
use tracing::{debug, info, instrument};

use crate::error::CharmError;
use crate::relation::{LogSource, TcpInput};

/// Section holding beaver's own settings
pub const BEAVER_SECTION: &str = "beaver";

/// Ordered sections of ordered `key = value` pairs
///
/// Values are stored verbatim: no quoting or escape processing on either side.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    ini: Ini,
}

impl ConfigDocument {
    /// Empty document
    #[must_use]
    pub fn new() -> Self {
        Self { ini: Ini::new() }
    }

    /// Parse INI text
    ///
    /// # Errors
    /// Returns the parser message for malformed input
    pub fn parse(text: &str) -> Result<Self, String> {
        let opt = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_str_opt(text, opt).map_err(|e| e.to_string())?;
        Ok(Self { ini })
    }

    /// Set `key` in `section`, creating the section when needed
    ///
    /// An existing key keeps its position within the section.
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(props) = self.ini.section_mut(Some(section))
            && let Some((_, slot)) = props.iter_mut().find(|(k, _)| *k == key)
        {
            *slot = value;
            return;
        }
        self.ini.with_section(Some(section)).set(key, value);
    }

    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.ini.get_from(Some(section), key)
    }

    #[must_use]
    pub fn has_section(&self, section: &str) -> bool {
        self.ini.section(Some(section)).is_some()
    }

    /// Named sections in document order
    #[must_use]
    pub fn sections(&self) -> Vec<&str> {
        self.ini.sections().flatten().collect()
    }

    /// Key/value pairs of `section` in order
    #[must_use]
    pub fn entries(&self, section: &str) -> Vec<(&str, &str)> {
        self.ini
            .section(Some(section))
            .map(|props| props.iter().collect())
            .unwrap_or_default()
    }

    /// Render as `[section]` headers followed by `key = value` lines
    ///
    /// # Errors
    /// Returns the writer error
    pub fn render(&self) -> io::Result<String> {
        let opt = WriteOption {
            escape_policy: EscapePolicy::Nothing,
            kv_separator: " = ",
            ..WriteOption::default()
        };
        let mut buf = Vec::new();
        self.ini.write_to_opt(&mut buf, opt)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// The file beaver reads its configuration from
#[derive(Debug, Clone)]
pub struct BeaverConfigFile {
    path: PathBuf,
}

impl BeaverConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current document on disk, or an empty one when the file does not exist
    pub fn load(&self) -> Result<ConfigDocument, CharmError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => ConfigDocument::parse(&text).map_err(|e| CharmError::file(&self.path, e)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(ConfigDocument::new()),
            Err(e) => Err(CharmError::file(&self.path, e)),
        }
    }

    /// Merge log sources into the existing file
    ///
    /// Each source gets a section named by its file with `type` set to its label.
    /// Sections already on disk are kept.
    #[instrument(skip_all, fields(path = %self.path.display(), sources = sources.len()))]
    pub fn write_logs_config(&self, sources: &[LogSource]) -> Result<(), CharmError> {
        let mut doc = self.load()?;
        for source in sources {
            doc.set(&source.file, "type", source.label.as_str());
        }
        doc.set(BEAVER_SECTION, "logstash_version", "1");

        self.save(&doc)?;
        info!("wrote beaver log sources");
        Ok(())
    }

    /// Replace the file with a document holding only the TCP output settings
    // Starts from an empty document: sections written by write_logs_config are dropped.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn write_tcp_config(&self, input: &TcpInput) -> Result<(), CharmError> {
        let mut doc = ConfigDocument::new();
        doc.set(BEAVER_SECTION, "tcp_host", input.address.as_str());
        doc.set(BEAVER_SECTION, "tcp_port", input.port.as_str());

        self.save(&doc)?;
        info!(host = %input.address, port = %input.port, "wrote beaver tcp output");
        Ok(())
    }

    /// Write through a sibling temp file and rename it over the target
    fn save(&self, doc: &ConfigDocument) -> Result<(), CharmError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| CharmError::file(parent, e))?;
        }

        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        let text = doc.render().map_err(|e| CharmError::file(&self.path, e))?;
        std::fs::write(&tmp_path, text).map_err(|e| CharmError::file(&tmp_path, e))?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| CharmError::file(&self.path, e))?;

        debug!(path = %self.path.display(), "config file replaced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn config_file(dir: &TempDir) -> BeaverConfigFile {
        BeaverConfigFile::new(dir.path().join("beaver").join("conf"))
    }

    fn tcp(address: &str, port: &str) -> TcpInput {
        TcpInput {
            address: address.to_string(),
            port: port.to_string(),
        }
    }

    #[test]
    fn test_logs_config_sections() {
        let dir = TempDir::new().unwrap();
        let file = config_file(&dir);

        file.write_logs_config(&[
            LogSource::new("syslog", "/var/log/syslog"),
            LogSource::new("auth", "/var/log/auth.log"),
        ])
        .unwrap();

        let doc = file.load().unwrap();
        assert_eq!(
            doc.sections(),
            vec!["/var/log/syslog", "/var/log/auth.log", "beaver"]
        );
        assert_eq!(doc.get("/var/log/syslog", "type"), Some("syslog"));
        assert_eq!(doc.get("/var/log/auth.log", "type"), Some("auth"));
        assert_eq!(doc.get("beaver", "logstash_version"), Some("1"));
    }

    #[test]
    fn test_last_label_for_a_file_wins() {
        let dir = TempDir::new().unwrap();
        let file = config_file(&dir);

        file.write_logs_config(&[
            LogSource::new("syslog", "/var/log/syslog"),
            LogSource::new("kernel", "/var/log/syslog"),
        ])
        .unwrap();

        let doc = file.load().unwrap();
        assert_eq!(doc.sections(), vec!["/var/log/syslog", "beaver"]);
        assert_eq!(doc.get("/var/log/syslog", "type"), Some("kernel"));
        assert_eq!(doc.entries("/var/log/syslog").len(), 1);
    }

    #[test]
    fn test_logs_config_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let file = config_file(&dir);
        let sources = [
            LogSource::new("apache", "/var/log/apache2/access.log"),
            LogSource::new("syslog", "/var/log/syslog"),
        ];

        file.write_logs_config(&sources).unwrap();
        let first = std::fs::read(file.path()).unwrap();
        file.write_logs_config(&sources).unwrap();
        let second = std::fs::read(file.path()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_logs_config_preserves_unrelated_sections() {
        let dir = TempDir::new().unwrap();
        let file = config_file(&dir);
        std::fs::create_dir_all(file.path().parent().unwrap()).unwrap();
        std::fs::write(
            file.path(),
            "[/var/log/nginx/error.log]\ntype = nginx\ntags = web,error\n\n\
             [beaver]\ntcp_host = 10.0.0.5\n",
        )
        .unwrap();

        file.write_logs_config(&[LogSource::new("syslog", "/var/log/syslog")])
            .unwrap();

        let doc = file.load().unwrap();
        assert_eq!(
            doc.entries("/var/log/nginx/error.log"),
            vec![("type", "nginx"), ("tags", "web,error")]
        );
        assert_eq!(doc.get("beaver", "tcp_host"), Some("10.0.0.5"));
        assert_eq!(doc.get("beaver", "logstash_version"), Some("1"));
        assert_eq!(doc.get("/var/log/syslog", "type"), Some("syslog"));
    }

    #[test]
    fn test_tcp_config_discards_previous_content() {
        let dir = TempDir::new().unwrap();
        let file = config_file(&dir);
        file.write_logs_config(&[LogSource::new("syslog", "/var/log/syslog")])
            .unwrap();

        file.write_tcp_config(&tcp("10.0.0.5", "5000")).unwrap();

        let doc = file.load().unwrap();
        assert_eq!(doc.sections(), vec!["beaver"]);
        assert_eq!(
            doc.entries("beaver"),
            vec![("tcp_host", "10.0.0.5"), ("tcp_port", "5000")]
        );
    }

    #[test]
    fn test_tcp_config_rendering() {
        let dir = TempDir::new().unwrap();
        let file = config_file(&dir);

        file.write_tcp_config(&tcp("10.0.0.5", "5000")).unwrap();

        let text = std::fs::read_to_string(file.path()).unwrap();
        assert!(text.contains("[beaver]\ntcp_host = 10.0.0.5\ntcp_port = 5000\n"));
        assert!(!dir.path().join("beaver").join("conf.tmp").exists());
    }

    #[test]
    fn test_values_are_kept_verbatim() {
        let dir = TempDir::new().unwrap();
        let file = config_file(&dir);
        let original = "[/var/log/app.log]\n\
                        type = app\n\
                        pattern = ^\\d+;#done\n\
                        path = C:\\logs\\app\n\
                        tags = \"quoted, value\"\n";
        std::fs::create_dir_all(file.path().parent().unwrap()).unwrap();
        std::fs::write(file.path(), original).unwrap();

        file.write_logs_config(&[LogSource::new("syslog", "/var/log/syslog")])
            .unwrap();

        let text = std::fs::read_to_string(file.path()).unwrap();
        assert!(text.starts_with(original));
        let doc = file.load().unwrap();
        assert_eq!(doc.get("/var/log/app.log", "tags"), Some("\"quoted, value\""));
        assert_eq!(doc.get("/var/log/app.log", "path"), Some("C:\\logs\\app"));
    }

    #[test]
    fn test_relabelled_file_keeps_key_order() {
        let dir = TempDir::new().unwrap();
        let file = config_file(&dir);
        std::fs::create_dir_all(file.path().parent().unwrap()).unwrap();
        std::fs::write(file.path(), "[/var/log/syslog]\ntype = old\ntags = x\n").unwrap();

        file.write_logs_config(&[LogSource::new("syslog", "/var/log/syslog")])
            .unwrap();

        let doc = file.load().unwrap();
        assert_eq!(
            doc.entries("/var/log/syslog"),
            vec![("type", "syslog"), ("tags", "x")]
        );
    }

    #[test]
    fn test_render_document() {
        let mut doc = ConfigDocument::new();
        doc.set(BEAVER_SECTION, "tcp_host", "10.0.0.5");
        doc.set(BEAVER_SECTION, "tcp_port", "5000");
        doc.set(BEAVER_SECTION, "tcp_host", "10.0.0.6");

        let text = doc.render().unwrap();

        assert!(text.starts_with("[beaver]\ntcp_host = 10.0.0.6\ntcp_port = 5000\n"));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let doc = config_file(&dir).load().unwrap();

        assert!(doc.sections().is_empty());
        assert!(!doc.has_section(BEAVER_SECTION));
    }
}
