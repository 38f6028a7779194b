use chrono::{DateTime, TimeZone};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Error, Writer};
use std::fmt::Display;

pub const EPG_TAG_TV: &str = "tv";
pub const EPG_TAG_PROGRAMME: &str = "programme";
pub const EPG_TAG_CHANNEL: &str = "channel";
pub const EPG_TAG_DISPLAY_NAME: &str = "display-name";
pub const EPG_TAG_ICON: &str = "icon";
pub const EPG_TAG_TITLE: &str = "title";
pub const EPG_TAG_SUB_TITLE: &str = "sub-title";
pub const EPG_TAG_DESC: &str = "desc";
pub const EPG_TAG_CATEGORY: &str = "category";
pub const EPG_ATTRIB_ID: &str = "id";
pub const EPG_ATTRIB_CHANNEL: &str = "channel";
pub const EPG_ATTRIB_START: &str = "start";
pub const EPG_ATTRIB_STOP: &str = "stop";
pub const EPG_ATTRIB_LANG: &str = "lang";
pub const EPG_ATTRIB_SRC: &str = "src";

pub const XMLTV_TIME_FORMAT: &str = "%Y%m%d%H%M%S %z";

// https://github.com/XMLTV/xmltv/blob/master/xmltv.dtd

pub fn format_xmltv_time<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    time.format(XMLTV_TIME_FORMAT).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlTag {
    pub name: String,
    pub value: Option<String>,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlTag>,
}

impl XmlTag {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            value: None,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.value = Some(text.to_string());
        self
    }

    pub fn with_child(mut self, child: XmlTag) -> Self {
        self.children.push(child);
        self
    }

    pub fn get_attribute_value(&self, attr_name: &str) -> Option<&str> {
        self.attributes.iter().find(|(k, _)| k == attr_name).map(|(_, v)| v.as_str())
    }

    fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<(), Error> {
        // empty icon not processed
        if self.name == EPG_TAG_ICON && self.get_attribute_value(EPG_ATTRIB_SRC).is_none_or(str::is_empty) {
            return Ok(());
        }

        let mut elem = BytesStart::new(self.name.as_str());
        for (k, v) in &self.attributes { elem.push_attribute((k.as_str(), v.as_str())); }

        if self.value.is_none() && self.children.is_empty() {
            writer.write_event(Event::Empty(elem))?;
            return Ok(());
        }

        writer.write_event(Event::Start(elem))?;
        if let Some(text) = self.value.as_ref() {
            writer.write_event(Event::Text(BytesText::new(text.as_str())))?;
        }
        for child in &self.children {
            child.write_to(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;
        Ok(())
    }
}

/// The `<tv>` document.
#[derive(Debug, Clone, Default)]
pub struct Epg {
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlTag>,
}

impl Epg {
    pub fn new(attributes: &[(&str, &str)]) -> Self {
        Self {
            attributes: attributes.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect(),
            children: Vec::new(),
        }
    }

    pub fn add_channel(&mut self, id: &str, display_name: &str, lang: &str, icon: Option<&str>) {
        let mut channel = XmlTag::new(EPG_TAG_CHANNEL)
            .with_attribute(EPG_ATTRIB_ID, id)
            .with_child(XmlTag::new(EPG_TAG_DISPLAY_NAME).with_attribute(EPG_ATTRIB_LANG, lang).with_text(display_name));
        if let Some(src) = icon {
            channel = channel.with_child(XmlTag::new(EPG_TAG_ICON).with_attribute(EPG_ATTRIB_SRC, src));
        }
        self.children.push(channel);
    }

    pub fn add_programme(&mut self, programme: XmlTag) {
        self.children.push(programme);
    }

    pub fn channel_count(&self) -> usize {
        self.children.iter().filter(|c| c.name == EPG_TAG_CHANNEL).count()
    }

    pub fn programme_count(&self) -> usize {
        self.children.iter().filter(|c| c.name == EPG_TAG_PROGRAMME).count()
    }

    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<(), quick_xml::Error> {
        let mut elem = BytesStart::new(EPG_TAG_TV);
        for (k, v) in &self.attributes { elem.push_attribute((k.as_str(), v.as_str())); }
        writer.write_event(Event::Start(elem))?;
        for child in &self.children {
            child.write_to(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(EPG_TAG_TV)))?;
        Ok(())
    }
}

/// Builds a `<programme>` with a localized title.
pub fn programme_tag(channel: &str, start: &str, stop: &str, title: &str, lang: &str) -> XmlTag {
    XmlTag::new(EPG_TAG_PROGRAMME)
        .with_attribute(EPG_ATTRIB_START, start)
        .with_attribute(EPG_ATTRIB_STOP, stop)
        .with_attribute(EPG_ATTRIB_CHANNEL, channel)
        .with_child(XmlTag::new(EPG_TAG_TITLE).with_attribute(EPG_ATTRIB_LANG, lang).with_text(title))
}
