use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::intent::is_pdfa_intent;
use crate::core::{HybridError, Rule};
use crate::pdf::{
    Dictionary, DocumentId, Object, ObjectRef, PdfWriter, Stream, decoded_content,
    descriptor_embeds_program, selected_fonts,
};

/// Bound on `Parent` hops when resolving inherited page attributes.
const MAX_TREE_DEPTH: usize = 32;

/// One failed archival rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub rule: Rule,
    pub detail: String,
}

impl Violation {
    fn new(rule: Rule, detail: impl Into<String>) -> Self {
        Self {
            rule,
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.rule, self.detail)
    }
}

/// Checks the written object graph against the PDF/A-3 and ZUGFeRD rules
/// before the cross-reference table is emitted.
///
/// The catalog must already be written; the trailer `ID` is checked as it
/// will be passed to [`PdfWriter::finalize`].
#[derive(Debug)]
pub struct ArchivalEnforcer<'a> {
    writer: &'a PdfWriter,
    catalog: ObjectRef,
    id: &'a DocumentId,
}

impl<'a> ArchivalEnforcer<'a> {
    pub fn new(writer: &'a PdfWriter, catalog: ObjectRef, id: &'a DocumentId) -> Self {
        Self { writer, catalog, id }
    }

    /// Every violation found, in rule order.
    pub fn violations(&self) -> Vec<Violation> {
        let mut out = Vec::new();
        let Some(catalog) = self.writer.get(self.catalog).and_then(Object::as_dict) else {
            out.push(Violation::new(
                Rule::MetadataStream,
                format!("catalog {} was not written", self.catalog),
            ));
            return out;
        };

        self.check_output_intent(catalog, &mut out);
        self.check_fonts(catalog, &mut out);
        self.check_metadata(catalog, &mut out);
        self.check_document_id(&mut out);
        self.check_forbidden(&mut out);
        self.check_attachments(catalog, &mut out);
        out.sort_by_key(|v| rule_order(v.rule));
        out
    }

    /// Fail with the first violation; every violation is logged.
    pub fn enforce(&self) -> Result<(), HybridError> {
        let violations = self.violations();
        for v in &violations {
            warn!(rule = %v.rule, detail = %v.detail, "archival rule violated");
        }
        match violations.into_iter().next() {
            Some(v) => Err(HybridError::violation(v.rule, v.detail)),
            None => {
                debug!("archival checks passed");
                Ok(())
            }
        }
    }

    fn resolve_dict<'o>(&'o self, object: Option<&'o Object>) -> Option<&'o Dictionary> {
        object
            .and_then(|o| self.writer.resolve(o))
            .and_then(Object::as_dict)
    }

    fn resolve_array<'o>(&'o self, object: Option<&'o Object>) -> Option<&'o [Object]> {
        object
            .and_then(|o| self.writer.resolve(o))
            .and_then(Object::as_array)
    }

    fn check_output_intent(&self, catalog: &Dictionary, out: &mut Vec<Violation>) {
        let intents = self.resolve_array(catalog.get("OutputIntents")).unwrap_or(&[]);
        if !intents.iter().any(|i| is_pdfa_intent(self.writer, i)) {
            out.push(Violation::new(
                Rule::OutputIntent,
                "no GTS_PDFA1 output intent with an embedded ICC profile",
            ));
        }
    }

    fn check_fonts(&self, catalog: &Dictionary, out: &mut Vec<Violation>) {
        let mut pages = Vec::new();
        let mut seen = BTreeSet::new();
        if let Some(root) = catalog.get("Pages") {
            self.collect_pages(root, &mut seen, &mut pages);
        }
        for (index, page) in pages.iter().enumerate() {
            let owner = format!("page {}", index + 1);
            let mut visited = BTreeSet::new();
            self.check_fonts_in(
                &owner,
                &self.content_streams(page.get("Contents")),
                self.resolve_dict(self.inherited(page, "Resources")),
                &mut visited,
                out,
            );
            self.check_annotations(page, &owner, &mut visited, out);
        }
    }

    fn collect_pages<'o>(
        &'o self,
        node: &'o Object,
        seen: &mut BTreeSet<u32>,
        pages: &mut Vec<&'o Dictionary>,
    ) {
        if let Some(r) = node.as_reference() {
            if !seen.insert(r.number) {
                return;
            }
        }
        let Some(dict) = self.resolve_dict(Some(node)) else {
            return;
        };
        match dict.get_name("Type") {
            Some("Pages") => {
                for kid in self.resolve_array(dict.get("Kids")).unwrap_or(&[]) {
                    self.collect_pages(kid, seen, pages);
                }
            }
            Some("Page") => pages.push(dict),
            _ => {}
        }
    }

    /// A page attribute, looked up through the `Parent` chain.
    fn inherited<'o>(&'o self, page: &'o Dictionary, key: &str) -> Option<&'o Object> {
        let mut node = page;
        for _ in 0..MAX_TREE_DEPTH {
            if let Some(value) = node.get(key) {
                return Some(value);
            }
            node = self.resolve_dict(node.get("Parent"))?;
        }
        None
    }

    /// `Contents` as a single stream or an array of streams.
    fn content_streams<'o>(&'o self, contents: Option<&'o Object>) -> Vec<&'o Stream> {
        match contents.and_then(|c| self.writer.resolve(c)) {
            Some(Object::Stream(stream)) => vec![stream],
            Some(Object::Array(parts)) => parts
                .iter()
                .filter_map(|p| self.writer.resolve(p))
                .filter_map(Object::as_stream)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Every font in `resources` must be embedded and every font the
    /// content selects must be listed there. Form XObjects are checked
    /// against their own resources, or the caller's when they have none.
    fn check_fonts_in(
        &self,
        owner: &str,
        streams: &[&Stream],
        resources: Option<&Dictionary>,
        visited: &mut BTreeSet<u32>,
        out: &mut Vec<Violation>,
    ) {
        let fonts = resources.and_then(|r| self.resolve_dict(r.get("Font")));
        if let Some(fonts) = fonts {
            for (key, font) in fonts.iter() {
                if let Some(detail) = self.font_problem(font) {
                    out.push(Violation::new(
                        Rule::FontNotEmbedded,
                        format!("{owner}: font /{} {detail}", key.as_str()),
                    ));
                }
            }
        }
        self.check_selected_fonts(owner, streams, fonts, out);

        let Some(xobjects) = resources.and_then(|r| self.resolve_dict(r.get("XObject"))) else {
            return;
        };
        for (key, xobject) in xobjects.iter() {
            if let Some(r) = xobject.as_reference() {
                if !visited.insert(r.number) {
                    continue;
                }
            }
            let Some(form) = self.writer.resolve(xobject).and_then(Object::as_stream) else {
                continue;
            };
            if form.dict.get_name("Subtype") != Some("Form") {
                continue;
            }
            let form_owner = format!("{owner} form /{}", key.as_str());
            match self.resolve_dict(form.dict.get("Resources")) {
                Some(own) => self.check_fonts_in(&form_owner, &[form], Some(own), visited, out),
                None => self.check_selected_fonts(&form_owner, &[form], fonts, out),
            }
        }
    }

    fn check_selected_fonts(
        &self,
        owner: &str,
        streams: &[&Stream],
        fonts: Option<&Dictionary>,
        out: &mut Vec<Violation>,
    ) {
        let mut content = Vec::new();
        for stream in streams {
            match decoded_content(stream) {
                Ok(bytes) => {
                    content.extend_from_slice(&bytes);
                    content.push(b'\n');
                }
                Err(e) => out.push(Violation::new(
                    Rule::FontNotEmbedded,
                    format!("{owner}: content cannot be scanned for fonts: {e}"),
                )),
            }
        }
        for id in selected_fonts(&content) {
            if !fonts.is_some_and(|f| f.contains_key(&id)) {
                out.push(Violation::new(
                    Rule::FontNotEmbedded,
                    format!("{owner}: content selects font /{id} which is not in its Resources/Font"),
                ));
            }
        }
    }

    /// Appearance streams (`/AP` `N`, `R`, `D`) of the page's annotations.
    fn check_annotations(
        &self,
        page: &Dictionary,
        owner: &str,
        visited: &mut BTreeSet<u32>,
        out: &mut Vec<Violation>,
    ) {
        let annotations = self.resolve_array(page.get("Annots")).unwrap_or(&[]);
        for (index, annotation) in annotations.iter().enumerate() {
            let Some(appearances) = self
                .resolve_dict(Some(annotation))
                .and_then(|a| self.resolve_dict(a.get("AP")))
            else {
                continue;
            };
            for (kind, appearance) in appearances.iter() {
                let kind_owner = format!("{owner} annotation {} /{}", index + 1, kind.as_str());
                match self.writer.resolve(appearance) {
                    Some(Object::Stream(stream)) => {
                        self.check_appearance(&kind_owner, appearance, stream, visited, out)
                    }
                    Some(Object::Dictionary(states)) => {
                        for (state, entry) in states.iter() {
                            if let Some(stream) = self.writer.resolve(entry).and_then(Object::as_stream) {
                                let state_owner = format!("{kind_owner} /{}", state.as_str());
                                self.check_appearance(&state_owner, entry, stream, visited, out);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    fn check_appearance(
        &self,
        owner: &str,
        entry: &Object,
        stream: &Stream,
        visited: &mut BTreeSet<u32>,
        out: &mut Vec<Violation>,
    ) {
        if let Some(r) = entry.as_reference() {
            if !visited.insert(r.number) {
                return;
            }
        }
        let resources = self.resolve_dict(stream.dict.get("Resources"));
        self.check_fonts_in(owner, &[stream], resources, visited, out);
    }

    fn font_problem(&self, font: &Object) -> Option<String> {
        let Some(font) = self.resolve_dict(Some(font)) else {
            return Some("does not resolve to a font dictionary".into());
        };
        let descriptor_owner = match font.get_name("Subtype") {
            // Glyphs are content streams inside the font itself.
            Some("Type3") => return None,
            Some("Type0") => match self
                .resolve_array(font.get("DescendantFonts"))
                .and_then(|a| a.first())
                .and_then(|d| self.resolve_dict(Some(d)))
            {
                Some(descendant) => descendant,
                None => return Some("has no descendant font".into()),
            },
            _ => font,
        };
        match self.resolve_dict(descriptor_owner.get("FontDescriptor")) {
            Some(descriptor) if descriptor_embeds_program(self.writer, descriptor) => None,
            Some(_) => Some("has no embedded FontFile program".into()),
            None => Some("has no FontDescriptor".into()),
        }
    }

    fn check_metadata(&self, catalog: &Dictionary, out: &mut Vec<Violation>) {
        let detail = match catalog.get("Metadata") {
            None => Some("catalog has no Metadata entry".to_string()),
            Some(Object::Reference(r)) => match self.writer.get(*r).and_then(Object::as_stream) {
                Some(s)
                    if s.dict.get_name("Type") == Some("Metadata")
                        && s.dict.get_name("Subtype") == Some("XML")
                        && !s.content.is_empty() =>
                {
                    None
                }
                Some(_) => Some(format!("{r} is not a /Metadata /XML stream")),
                None => Some(format!("{r} does not resolve to a stream")),
            },
            Some(_) => Some("Metadata must be an indirect reference to a stream".to_string()),
        };
        if let Some(detail) = detail {
            out.push(Violation::new(Rule::MetadataStream, detail));
        }
    }

    fn check_document_id(&self, out: &mut Vec<Violation>) {
        let (first, second) = (self.id.permanent.len(), self.id.changing.len());
        if first != 16 || second != 16 {
            out.push(Violation::new(
                Rule::DocumentId,
                format!("ID halves must be 16 bytes, got {first} and {second}"),
            ));
        }
    }

    fn check_forbidden(&self, out: &mut Vec<Violation>) {
        for (r, object) in self.writer.objects() {
            let dict = match object {
                Object::Stream(s) => Some(&s.dict),
                _ => None,
            };
            if let Some(dict) = dict {
                check_dictionary(r, dict, out);
            }
            walk(object, &mut |d| check_dictionary(r, d, out));
        }
    }

    fn check_attachments(&self, catalog: &Dictionary, out: &mut Vec<Violation>) {
        let mut named = BTreeSet::new();
        let tree = self
            .resolve_dict(catalog.get("Names"))
            .and_then(|n| self.resolve_dict(n.get("EmbeddedFiles")));
        if let Some(tree) = tree {
            self.collect_name_tree(tree, &mut BTreeSet::new(), &mut named);
        }

        let associated: BTreeSet<ObjectRef> = self
            .resolve_array(catalog.get("AF"))
            .unwrap_or(&[])
            .iter()
            .filter_map(Object::as_reference)
            .collect();

        if named.is_empty() && associated.is_empty() {
            out.push(Violation::new(
                Rule::EmbeddedFileRegistration,
                "no embedded invoice file registered",
            ));
            return;
        }
        for r in named.symmetric_difference(&associated) {
            let missing = if named.contains(r) { "AF" } else { "Names/EmbeddedFiles" };
            out.push(Violation::new(
                Rule::EmbeddedFileRegistration,
                format!("file specification {r} is missing from {missing}"),
            ));
        }

        for r in named.union(&associated) {
            let Some(spec) = self.writer.get(*r).and_then(Object::as_dict) else {
                continue;
            };
            let embedded = self
                .resolve_dict(spec.get("EF"))
                .and_then(|ef| ef.get("F"))
                .and_then(|f| self.writer.resolve(f))
                .and_then(Object::as_stream)
                .is_some_and(|s| s.dict.get_name("Type") == Some("EmbeddedFile"));
            if !embedded {
                out.push(Violation::new(
                    Rule::EmbeddedFileRegistration,
                    format!("file specification {r} has no embedded file stream"),
                ));
            }
        }
    }

    fn collect_name_tree(
        &self,
        node: &Dictionary,
        seen: &mut BTreeSet<u32>,
        out: &mut BTreeSet<ObjectRef>,
    ) {
        for pair in self.resolve_array(node.get("Names")).unwrap_or(&[]).chunks(2) {
            if let [_, Object::Reference(r)] = pair {
                out.insert(*r);
            }
        }
        for kid in self.resolve_array(node.get("Kids")).unwrap_or(&[]) {
            if let Some(r) = kid.as_reference() {
                if !seen.insert(r.number) {
                    continue;
                }
            }
            if let Some(kid) = self.resolve_dict(Some(kid)) {
                self.collect_name_tree(kid, seen, out);
            }
        }
    }
}

fn rule_order(rule: Rule) -> usize {
    [
        Rule::OutputIntent,
        Rule::FontNotEmbedded,
        Rule::MetadataStream,
        Rule::DocumentId,
        Rule::Encryption,
        Rule::JavaScript,
        Rule::LaunchAction,
        Rule::ExternalReference,
        Rule::TransparencyGroup,
        Rule::AfRelationship,
        Rule::EmbeddedFileRegistration,
    ]
    .iter()
    .position(|r| *r == rule)
    .unwrap_or(usize::MAX)
}

/// Visit every dictionary nested inside `object` (not following references).
fn walk(object: &Object, visit: &mut impl FnMut(&Dictionary)) {
    match object {
        Object::Array(items) => items.iter().for_each(|o| walk(o, visit)),
        Object::Dictionary(d) => {
            visit(d);
            d.iter().for_each(|(_, o)| walk(o, visit));
        }
        Object::Stream(s) => s.dict.iter().for_each(|(_, o)| walk(o, visit)),
        _ => {}
    }
}

fn check_dictionary(owner: ObjectRef, dict: &Dictionary, out: &mut Vec<Violation>) {
    let mut push = |rule, what: &str| out.push(Violation::new(rule, format!("{what} in object {owner}")));

    if dict.contains_key("Encrypt") || dict.get_name("Filter") == Some("Standard") {
        push(Rule::Encryption, "encryption dictionary");
    }
    if dict.contains_key("JS") || dict.contains_key("JavaScript") {
        push(Rule::JavaScript, "JavaScript entry");
    }
    match dict.get_name("S") {
        Some("JavaScript") => push(Rule::JavaScript, "JavaScript action"),
        Some("Launch") => push(Rule::LaunchAction, "Launch action"),
        Some("GoToR") | Some("GoToE") | Some("ImportData") => {
            push(Rule::ExternalReference, "remote action")
        }
        Some("Transparency") if !dict.contains_key("CS") => {
            push(Rule::TransparencyGroup, "transparency group without /CS")
        }
        _ => {}
    }
    if dict.get_name("Subtype") == Some("Form") && dict.contains_key("Ref") {
        push(Rule::ExternalReference, "reference XObject");
    }
    if dict.get_name("FS") == Some("URL") {
        push(Rule::ExternalReference, "URL file specification");
    }
    if dict.get_name("Type") == Some("Filespec") {
        match dict.get_name("AFRelationship") {
            Some("Alternative") => {}
            Some(other) => push(
                Rule::AfRelationship,
                &format!("AFRelationship /{other} (only /Alternative is allowed)"),
            ),
            None => push(Rule::AfRelationship, "file specification without AFRelationship"),
        }
    }
}
