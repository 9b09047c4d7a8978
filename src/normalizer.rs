// 🔬 Record Normalizer - One XML fragment in, one typed record set out
//
// The bulk extract is optional-heavy: besides the mandatory ABN header every
// block may be absent, and text/numeric sub-fields inside a present block may
// be blank. Absent blocks are omitted from the output; blank text degrades to
// "" and blank/non-numeric postcodes to 0. Only the required header fields
// can fail a fragment.

use chrono::NaiveDate;
use roxmltree::{Document, Node};
use thiserror::Error;

use crate::entities::{Abn, AsicNumber, Dgr, Gst, LegalEntity, MainEntity, OtherEntity};

/// Compact date format used throughout the extract (e.g. "20000224").
const DATE_FORMAT: &str = "%Y%m%d";

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("fragment is not well-formed XML: {0}")]
    MalformedFragment(#[from] roxmltree::Error),

    #[error("unexpected root element <{0}>")]
    UnexpectedRoot(String),

    #[error("required field missing or unusable: {0}")]
    MissingRequiredField(&'static str),

    #[error("record identifier is not numeric: {0:?}")]
    InvalidIdentifier(String),
}

/// Everything one fragment contributes to the batch. Kinds the fragment does
/// not carry stay `None` / empty.
#[derive(Debug, Clone)]
pub struct RecordSet {
    pub abn: Abn,
    pub main_entity: Option<MainEntity>,
    pub legal_entity: Option<LegalEntity>,
    pub asic_number: Option<AsicNumber>,
    pub gst: Option<Gst>,
    pub dgr: Vec<Dgr>,
    pub other_entities: Vec<OtherEntity>,
}

/// Parse one `<ABR>` fragment into its typed entities.
///
/// The ABN value, its status attributes, and the entity-type pair are
/// required; everything else is optional with local fallbacks.
pub fn normalize(fragment: &str) -> Result<RecordSet, NormalizeError> {
    let doc = Document::parse(fragment)?;
    let root = doc.root_element();
    if !root.has_tag_name("ABR") {
        return Err(NormalizeError::UnexpectedRoot(
            root.tag_name().name().to_string(),
        ));
    }

    let abn_node =
        child(root, "ABN").ok_or(NormalizeError::MissingRequiredField("ABN"))?;
    let abn_text = abn_node
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(NormalizeError::MissingRequiredField("ABN"))?;
    let abn: i64 = abn_text
        .parse()
        .map_err(|_| NormalizeError::InvalidIdentifier(abn_text.to_string()))?;

    let status = required_attr(abn_node, "status")?;
    let status_from_date = parse_compact_date(&required_attr(abn_node, "ABNStatusFromDate")?)
        .ok_or(NormalizeError::MissingRequiredField("ABNStatusFromDate"))?;

    let entity_type =
        child(root, "EntityType").ok_or(NormalizeError::MissingRequiredField("EntityType"))?;
    let entity_type_indicator = required_child_text(entity_type, "EntityTypeInd")?;
    let entity_type_text = required_child_text(entity_type, "EntityTypeText")?;

    let mut set = RecordSet {
        abn: Abn {
            abn,
            status,
            status_from_date,
            entity_type_indicator,
            entity_type_text,
        },
        main_entity: None,
        legal_entity: None,
        asic_number: None,
        gst: None,
        dgr: Vec::new(),
        other_entities: Vec::new(),
    };

    if let Some(block) = child(root, "MainEntity") {
        let name_node = child(block, "NonIndividualName");
        let (state, postcode) = address_details(block);
        set.main_entity = Some(MainEntity {
            abn,
            entity_type: attr_or_empty(name_node, "type"),
            name: name_node
                .map(|n| child_text(n, "NonIndividualNameText"))
                .unwrap_or_default(),
            state,
            postcode,
        });
    }

    if let Some(block) = child(root, "LegalEntity") {
        let name_node = child(block, "IndividualName");
        let given = name_node
            .map(|n| child_text(n, "GivenName"))
            .unwrap_or_default();
        let family = name_node
            .map(|n| child_text(n, "FamilyName"))
            .unwrap_or_default();
        let (state, postcode) = address_details(block);
        set.legal_entity = Some(LegalEntity {
            abn,
            entity_type: attr_or_empty(name_node, "type"),
            // The separating space stays even when the given name is empty.
            name: format!("{} {}", given, family),
            state,
            postcode,
        });
    }

    if let Some(node) = child(root, "ASICNumber") {
        set.asic_number = Some(AsicNumber {
            abn,
            number: node.text().map(|t| t.trim().to_string()).unwrap_or_default(),
            asic_type: attr_or_empty(Some(node), "ASICNumberType"),
        });
    }

    if let Some(node) = child(root, "GST") {
        set.gst = Some(Gst {
            abn,
            status: attr_or_empty(Some(node), "status"),
            status_from_date: node
                .attribute("GSTStatusFromDate")
                .and_then(parse_compact_date),
        });
    }

    for node in root.children().filter(|n| n.has_tag_name("DGR")) {
        set.dgr.push(Dgr {
            abn,
            status_from_date: node
                .attribute("DGRStatusFromDate")
                .and_then(parse_compact_date),
            name: child(node, "NonIndividualName")
                .map(|n| child_text(n, "NonIndividualNameText"))
                .unwrap_or_default(),
        });
    }

    for node in root.children().filter(|n| n.has_tag_name("OtherEntity")) {
        let name_node = child(node, "NonIndividualName");
        set.other_entities.push(OtherEntity {
            abn,
            entity_type: attr_or_empty(name_node, "type"),
            name: name_node
                .map(|n| child_text(n, "NonIndividualNameText"))
                .unwrap_or_default(),
        });
    }

    Ok(set)
}

// ============================================================================
// FIELD HELPERS
// ============================================================================

fn child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.children().find(|c| c.has_tag_name(name))
}

/// Text of a named child, trimmed; "" when the child or its text is absent.
fn child_text(node: Node, name: &str) -> String {
    child(node, name)
        .and_then(|n| n.text())
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}

fn attr_or_empty(node: Option<Node>, name: &str) -> String {
    node.and_then(|n| n.attribute(name))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

fn required_attr(node: Node, name: &'static str) -> Result<String, NormalizeError> {
    node.attribute(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(NormalizeError::MissingRequiredField(name))
}

fn required_child_text(node: Node, name: &'static str) -> Result<String, NormalizeError> {
    let text = child_text(node, name);
    if text.is_empty() {
        Err(NormalizeError::MissingRequiredField(name))
    } else {
        Ok(text)
    }
}

/// State and postcode out of a block's BusinessAddress, wherever it nests.
fn address_details(block: Node) -> (String, i32) {
    match block.descendants().find(|n| n.has_tag_name("AddressDetails")) {
        Some(details) => (
            child_text(details, "State"),
            parse_postcode(&child_text(details, "Postcode")),
        ),
        None => (String::new(), 0),
    }
}

/// Blank and non-numeric postcodes are expected in the extract; both map to
/// the 0 sentinel instead of failing the record.
fn parse_postcode(text: &str) -> i32 {
    text.trim().parse().unwrap_or(0)
}

fn parse_compact_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok()
}
