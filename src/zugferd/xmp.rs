use chrono::{DateTime, FixedOffset, NaiveDate};

use super::profile::{AttachmentName, ZugferdProfile};
use crate::dictionary;
use crate::pdf::Stream;
use crate::pdf::date::xmp_date;

/// Escape `&`, `<`, `>`, `"` and `'` for XML text and attribute values.
///
/// A single pass; text without these characters is returned unchanged.
pub fn escape_xml(text: &str) -> String {
    quick_xml::escape::escape(text).into_owned()
}

/// Document metadata written into the XMP packet.
///
/// The values must agree with the Info dictionary; PDF/A validators compare
/// title, author, producer and both dates.
#[derive(Debug, Clone)]
pub struct XmpMetadata {
    pub title: String,
    pub author: String,
    pub invoice_date: NaiveDate,
    pub producer: String,
    pub creator_tool: String,
    pub created: DateTime<FixedOffset>,
    pub attachment: AttachmentName,
    pub profile: ZugferdProfile,
}

impl XmpMetadata {
    /// The complete packet, from `<?xpacket begin` to `<?xpacket end="w"?>`.
    pub fn to_xml(&self) -> String {
        let prefix = self.attachment.prefix();
        let namespace = self.attachment.namespace();
        let date = xmp_date(&self.created);

        format!(
            r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?>
<x:xmpmeta xmlns:x="adobe:ns:meta/">
  <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
    <rdf:Description rdf:about=""
        xmlns:pdfaid="http://www.aiim.org/pdfa/ns/id/">
      <pdfaid:part>3</pdfaid:part>
      <pdfaid:conformance>U</pdfaid:conformance>
    </rdf:Description>
    <rdf:Description rdf:about=""
        xmlns:dc="http://purl.org/dc/elements/1.1/">
      <dc:format>application/pdf</dc:format>
      <dc:title>
        <rdf:Alt>
          <rdf:li xml:lang="x-default">{title}</rdf:li>
        </rdf:Alt>
      </dc:title>
      <dc:creator>
        <rdf:Seq>
          <rdf:li>{author}</rdf:li>
        </rdf:Seq>
      </dc:creator>
      <dc:date>
        <rdf:Seq>
          <rdf:li>{invoice_date}</rdf:li>
        </rdf:Seq>
      </dc:date>
    </rdf:Description>
    <rdf:Description rdf:about=""
        xmlns:pdf="http://ns.adobe.com/pdf/1.3/">
      <pdf:Producer>{producer}</pdf:Producer>
    </rdf:Description>
    <rdf:Description rdf:about=""
        xmlns:xmp="http://ns.adobe.com/xap/1.0/">
      <xmp:CreatorTool>{creator_tool}</xmp:CreatorTool>
      <xmp:CreateDate>{date}</xmp:CreateDate>
      <xmp:ModifyDate>{date}</xmp:ModifyDate>
      <xmp:MetadataDate>{date}</xmp:MetadataDate>
    </rdf:Description>
    <rdf:Description rdf:about=""
        xmlns:pdfaExtension="http://www.aiim.org/pdfa/ns/extension/"
        xmlns:pdfaSchema="http://www.aiim.org/pdfa/ns/schema#"
        xmlns:pdfaProperty="http://www.aiim.org/pdfa/ns/property#">
      <pdfaExtension:schemas>
        <rdf:Bag>
          <rdf:li rdf:parseType="Resource">
            <pdfaSchema:schema>{schema_name}</pdfaSchema:schema>
            <pdfaSchema:namespaceURI>{namespace}</pdfaSchema:namespaceURI>
            <pdfaSchema:prefix>{prefix}</pdfaSchema:prefix>
            <pdfaSchema:property>
              <rdf:Seq>
                <rdf:li rdf:parseType="Resource">
                  <pdfaProperty:name>DocumentFileName</pdfaProperty:name>
                  <pdfaProperty:valueType>Text</pdfaProperty:valueType>
                  <pdfaProperty:category>external</pdfaProperty:category>
                  <pdfaProperty:description>name of the embedded XML invoice file</pdfaProperty:description>
                </rdf:li>
                <rdf:li rdf:parseType="Resource">
                  <pdfaProperty:name>DocumentType</pdfaProperty:name>
                  <pdfaProperty:valueType>Text</pdfaProperty:valueType>
                  <pdfaProperty:category>external</pdfaProperty:category>
                  <pdfaProperty:description>INVOICE</pdfaProperty:description>
                </rdf:li>
                <rdf:li rdf:parseType="Resource">
                  <pdfaProperty:name>Version</pdfaProperty:name>
                  <pdfaProperty:valueType>Text</pdfaProperty:valueType>
                  <pdfaProperty:category>external</pdfaProperty:category>
                  <pdfaProperty:description>The actual version of the invoice data schema</pdfaProperty:description>
                </rdf:li>
                <rdf:li rdf:parseType="Resource">
                  <pdfaProperty:name>ConformanceLevel</pdfaProperty:name>
                  <pdfaProperty:valueType>Text</pdfaProperty:valueType>
                  <pdfaProperty:category>external</pdfaProperty:category>
                  <pdfaProperty:description>The conformance level of the embedded invoice data</pdfaProperty:description>
                </rdf:li>
              </rdf:Seq>
            </pdfaSchema:property>
          </rdf:li>
        </rdf:Bag>
      </pdfaExtension:schemas>
    </rdf:Description>
    <rdf:Description rdf:about=""
        xmlns:{prefix}="{namespace}">
      <{prefix}:DocumentType>INVOICE</{prefix}:DocumentType>
      <{prefix}:DocumentFileName>{file_name}</{prefix}:DocumentFileName>
      <{prefix}:Version>{version}</{prefix}:Version>
      <{prefix}:ConformanceLevel>{level}</{prefix}:ConformanceLevel>
    </rdf:Description>
  </rdf:RDF>
</x:xmpmeta>
<?xpacket end="w"?>"#,
            title = escape_xml(&self.title),
            author = escape_xml(&self.author),
            invoice_date = self.invoice_date.format("%Y-%m-%d"),
            producer = escape_xml(&self.producer),
            creator_tool = escape_xml(&self.creator_tool),
            schema_name = self.attachment.schema_name(),
            file_name = self.attachment.file_name(),
            version = self.attachment.version(),
            level = self.profile.conformance_level(),
        )
    }

    /// The packet as an unfiltered `/Type /Metadata /Subtype /XML` stream.
    pub fn to_stream(&self) -> Stream {
        Stream::new(
            dictionary! {
                "Type" => "Metadata",
                "Subtype" => "XML",
            },
            self.to_xml().into_bytes(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(number: &str) -> XmpMetadata {
        XmpMetadata {
            title: format!("Rechnung {number}"),
            author: "hybridbeleg".into(),
            invoice_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            producer: "hybridbeleg PDF/A-3 Generator".into(),
            creator_tool: "hybridbeleg".into(),
            created: DateTime::parse_from_rfc3339("2024-03-15T10:00:00+01:00").unwrap(),
            attachment: AttachmentName::Zugferd,
            profile: ZugferdProfile::EN16931,
        }
    }

    #[test]
    fn escapes_in_one_pass() {
        assert_eq!(escape_xml(r#"&<>"'"#), "&amp;&lt;&gt;&quot;&apos;");
        assert_eq!(escape_xml("&amp;"), "&amp;amp;");
        assert_eq!(escape_xml("R-2024-0001"), "R-2024-0001");
    }

    #[test]
    fn packet_declares_pdfa_3u() {
        let xml = metadata("R-2024-0001").to_xml();
        assert!(xml.starts_with(r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?>"#));
        assert!(xml.ends_with(r#"<?xpacket end="w"?>"#));
        assert!(xml.contains("<pdfaid:part>3</pdfaid:part>"));
        assert!(xml.contains("<pdfaid:conformance>U</pdfaid:conformance>"));
        assert!(xml.contains(r#"<rdf:li xml:lang="x-default">Rechnung R-2024-0001</rdf:li>"#));
        assert!(xml.contains("<rdf:li>2024-03-15</rdf:li>"));
        assert!(xml.contains("<xmp:CreateDate>2024-03-15T10:00:00+01:00</xmp:CreateDate>"));
        assert!(xml.contains("<zf:DocumentFileName>ZUGFeRD-invoice.xml</zf:DocumentFileName>"));
        assert!(xml.contains("<zf:ConformanceLevel>EN 16931</zf:ConformanceLevel>"));
    }

    #[test]
    fn title_is_escaped() {
        let xml = metadata(r#"&<>""#).to_xml();
        assert!(xml.contains("Rechnung &amp;&lt;&gt;&quot;"));
    }

    #[test]
    fn factur_x_uses_fx_schema() {
        let mut m = metadata("1");
        m.attachment = AttachmentName::FacturX;
        let xml = m.to_xml();
        assert!(xml.contains(r#"xmlns:fx="urn:factur-x:pdfa:CrossIndustryDocument:invoice:1p0#""#));
        assert!(xml.contains("<fx:DocumentFileName>factur-x.xml</fx:DocumentFileName>"));
    }

    #[test]
    fn stream_is_unfiltered_metadata() {
        let s = metadata("1").to_stream();
        assert_eq!(s.dict.get_name("Type"), Some("Metadata"));
        assert_eq!(s.dict.get_name("Subtype"), Some("XML"));
        assert!(!s.dict.contains_key("Filter"));
    }
}
