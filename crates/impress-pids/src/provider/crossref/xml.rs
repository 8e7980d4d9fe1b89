//! Crossref deposit document (schema 5.3.1, `database`/`dataset` content type)

use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{PidError, Result};
use crate::record::{Creator, Record};

pub const SCHEMA_VERSION: &str = "5.3.1";
const NAMESPACE: &str = "http://www.crossref.org/schema/5.3.1";
const SCHEMA_LOCATION: &str =
    "http://www.crossref.org/schema/5.3.1 http://www.crossref.org/schemas/crossref5.3.1.xsd";

/// The `<head>` of a deposit batch
#[derive(Debug, Clone)]
pub struct DepositHead<'a> {
    pub batch_id: &'a str,
    /// `YYYYMMDDhhmmss`
    pub timestamp: &'a str,
    pub depositor: &'a str,
    pub email: &'a str,
    pub registrant: &'a str,
}

type XmlWriter = Writer<Cursor<Vec<u8>>>;

fn xml_err(e: quick_xml::Error) -> PidError {
    PidError::Serialization(e.to_string())
}

fn start(writer: &mut XmlWriter, element: BytesStart<'_>) -> Result<()> {
    writer.write_event(Event::Start(element)).map_err(xml_err)
}

fn end(writer: &mut XmlWriter, name: &str) -> Result<()> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_err)
}

fn text_element(writer: &mut XmlWriter, name: &str, text: &str) -> Result<()> {
    start(writer, BytesStart::new(name))?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_err)?;
    end(writer, name)
}

fn write_head(writer: &mut XmlWriter, head: &DepositHead<'_>) -> Result<()> {
    start(writer, BytesStart::new("head"))?;
    text_element(writer, "doi_batch_id", head.batch_id)?;
    text_element(writer, "timestamp", head.timestamp)?;
    start(writer, BytesStart::new("depositor"))?;
    text_element(writer, "depositor_name", head.depositor)?;
    text_element(writer, "email_address", head.email)?;
    end(writer, "depositor")?;
    text_element(writer, "registrant", head.registrant)?;
    end(writer, "head")
}

fn write_contributor(writer: &mut XmlWriter, creator: &Creator, first: bool) -> Result<()> {
    let sequence = if first { "first" } else { "additional" };
    let attrs = [("contributor_role", "author"), ("sequence", sequence)];

    match &creator.family_name {
        Some(family_name) => {
            start(
                writer,
                BytesStart::new("person_name").with_attributes(attrs),
            )?;
            if let Some(given_name) = &creator.given_name {
                text_element(writer, "given_name", given_name)?;
            }
            text_element(writer, "surname", family_name)?;
            if let Some(orcid) = &creator.orcid {
                text_element(writer, "ORCID", &format!("https://orcid.org/{}", orcid))?;
            }
            end(writer, "person_name")
        }
        None => {
            start(
                writer,
                BytesStart::new("organization").with_attributes(attrs),
            )?;
            writer
                .write_event(Event::Text(BytesText::new(&creator.name)))
                .map_err(xml_err)?;
            end(writer, "organization")
        }
    }
}

fn write_publication_date(
    writer: &mut XmlWriter,
    (year, month, day): (i32, Option<u32>, Option<u32>),
) -> Result<()> {
    start(writer, BytesStart::new("database_date"))?;
    start(writer, BytesStart::new("publication_date"))?;
    if let Some(month) = month {
        text_element(writer, "month", &format!("{:02}", month))?;
    }
    if let Some(day) = day {
        text_element(writer, "day", &format!("{:02}", day))?;
    }
    text_element(writer, "year", &year.to_string())?;
    end(writer, "publication_date")?;
    end(writer, "database_date")
}

/// Build the deposit document registering `doi` at `url` for `record`.
pub fn dataset_deposit(head: &DepositHead<'_>, record: &Record, doi: &str, url: &str) -> Result<String> {
    let publisher = record.publisher().unwrap_or(head.registrant);
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;
    start(
        &mut writer,
        BytesStart::new("doi_batch").with_attributes([
            ("xmlns", NAMESPACE),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
            ("version", SCHEMA_VERSION),
            ("xsi:schemaLocation", SCHEMA_LOCATION),
        ]),
    )?;
    write_head(&mut writer, head)?;

    start(&mut writer, BytesStart::new("body"))?;
    start(&mut writer, BytesStart::new("database"))?;

    start(
        &mut writer,
        BytesStart::new("database_metadata").with_attributes([("language", "en")]),
    )?;
    start(&mut writer, BytesStart::new("titles"))?;
    text_element(&mut writer, "title", publisher)?;
    end(&mut writer, "titles")?;
    start(&mut writer, BytesStart::new("publisher"))?;
    text_element(&mut writer, "publisher_name", publisher)?;
    end(&mut writer, "publisher")?;
    end(&mut writer, "database_metadata")?;

    start(
        &mut writer,
        BytesStart::new("dataset").with_attributes([("dataset_type", "record")]),
    )?;
    if !record.metadata.creators.is_empty() {
        start(&mut writer, BytesStart::new("contributors"))?;
        for (i, creator) in record.metadata.creators.iter().enumerate() {
            write_contributor(&mut writer, creator, i == 0)?;
        }
        end(&mut writer, "contributors")?;
    }
    start(&mut writer, BytesStart::new("titles"))?;
    text_element(&mut writer, "title", &record.metadata.title)?;
    end(&mut writer, "titles")?;
    if let Some(date) = record.publication_date_parts() {
        write_publication_date(&mut writer, date)?;
    }
    start(&mut writer, BytesStart::new("doi_data"))?;
    text_element(&mut writer, "doi", doi)?;
    text_element(&mut writer, "resource", url)?;
    end(&mut writer, "doi_data")?;
    end(&mut writer, "dataset")?;

    end(&mut writer, "database")?;
    end(&mut writer, "body")?;
    end(&mut writer, "doi_batch")?;

    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| PidError::Serialization(e.to_string()))
}
