use crate::error::{info_err, TvEpgError};
use crate::model::Epg;
use crate::utils::debug_if_enabled;
use quick_xml::events::{BytesDecl, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;

/// Serializes the epg with declaration and doctype, indented by two spaces.
pub fn epg_to_bytes(epg: &Epg) -> Result<Vec<u8>, TvEpgError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::with_capacity(64 * 1024)), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(|e| info_err!("failed to write XML header: {e}"))?;
    writer.write_event(Event::DocType(BytesText::new("tv SYSTEM \"xmltv.dtd\"")))
        .map_err(|e| info_err!("failed to write doctype: {e}"))?;
    epg.write_to(&mut writer).map_err(|e| info_err!("failed to write epg: {e}"))?;

    let mut bytes = writer.into_inner().into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

pub async fn epg_write_file(epg: &Epg, path: &Path) -> Result<(), TvEpgError> {
    let content = epg_to_bytes(epg)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await
            .map_err(|e| info_err!("failed to create epg dir: {} - {e}", parent.display()))?;
    }
    tokio::fs::write(path, content).await
        .map_err(|e| info_err!("failed to write epg: {} - {e}", path.display()))?;
    debug_if_enabled!("Epg written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{epg_to_bytes, epg_write_file};
    use crate::model::{programme_tag, Epg};

    fn sample_epg() -> Epg {
        let mut epg = Epg::new(&[("generator-info-name", "tvepg"), ("generator-info-url", "")]);
        epg.add_channel("DAZN 1", "DAZN 1", "zh", None);
        epg.add_programme(programme_tag("DAZN 1", "20251107000000 +0800", "20251107010000 +0800", "F1", "zh"));
        epg
    }

    #[test]
    fn test_epg_to_bytes() {
        let xml = String::from_utf8(epg_to_bytes(&sample_epg()).unwrap()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE tv SYSTEM \"xmltv.dtd\">\n<tv "));
        assert!(xml.contains("generator-info-url=\"\""));
        assert!(xml.contains("\n  <channel id=\"DAZN 1\">\n    <display-name lang=\"zh\">DAZN 1</display-name>\n  </channel>"));
        assert!(xml.contains("<title lang=\"zh\">F1</title>"));
        assert!(xml.ends_with("</tv>\n"));
    }

    #[tokio::test]
    async fn test_epg_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tvgo.xml");
        epg_write_file(&sample_epg(), &path).await.unwrap();
        let xml = std::fs::read_to_string(&path).unwrap();
        assert!(xml.contains("<programme start=\"20251107000000 +0800\" stop=\"20251107010000 +0800\" channel=\"DAZN 1\">"));
    }
}
