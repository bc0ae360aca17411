//! Parameter schema extraction from the `<mbr-parameters>` declaration block.
//!
//! The declaration block enumerates the user-editable controls of a component.
//! Extraction runs as a single streaming pass over the template with `lol_html`
//! element and text handlers; every handler appends to a shared collector so the
//! resulting control list keeps declaration order.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use lol_html::{RewriteStrSettings, element, rewrite_str, text};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tag name of the declaration block.
pub const DECLARATION_TAG: &str = "mbr-parameters";

/// Errors emitted while scanning a template for its declaration block.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The streaming scanner rejected the template.
    #[error("Failed to scan parameter declaration: {0}")]
    Rewrite(String),
}

/// Kind of a declared control.
///
/// Inputs take their kind from the `type` attribute, fieldsets from their own
/// `type` attribute. Kinds outside the known set are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ControlKind {
    /// Section header grouping the controls below it.
    Header,
    /// Boolean toggle.
    Checkbox,
    /// Numeric slider.
    Range,
    /// Colour picker.
    Color,
    /// Image path.
    Image,
    /// Video URL.
    Video,
    /// Single choice among options.
    Select,
    /// Background fieldset (colour/image/video alternatives).
    Background,
    /// Plain text input.
    Text,
    /// Any other declared type.
    Other(String),
}

impl ControlKind {
    /// Maps a lowercased `type` attribute to a kind.
    pub fn from_type(kind: &str) -> Self {
        match kind {
            "header" => Self::Header,
            "checkbox" => Self::Checkbox,
            "range" => Self::Range,
            "color" => Self::Color,
            "image" => Self::Image,
            "video" => Self::Video,
            "select" => Self::Select,
            "background" => Self::Background,
            "text" => Self::Text,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the textual kind, as written in the template.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Header => "header",
            Self::Checkbox => "checkbox",
            Self::Range => "range",
            Self::Color => "color",
            Self::Image => "image",
            Self::Video => "video",
            Self::Select => "select",
            Self::Background => "background",
            Self::Text => "text",
            Self::Other(kind) => kind,
        }
    }
}

impl From<String> for ControlKind {
    fn from(value: String) -> Self {
        Self::from_type(&value.to_ascii_lowercase())
    }
}

impl From<ControlKind> for String {
    fn from(value: ControlKind) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for ControlKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes carried by a control besides its identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlAttrs {
    /// Visibility condition expression for the editor UI.
    pub condition: Option<String>,
    /// Lower bound of a range.
    pub min: Option<String>,
    /// Upper bound of a range.
    pub max: Option<String>,
    /// Step of a range.
    pub step: Option<String>,
    /// Whether the control is laid out inline.
    pub inline: bool,
    /// Whether the control (a fieldset alternative) is preselected.
    pub selected: bool,
    /// Whether a checkbox starts checked.
    pub checked: bool,
    /// Whether a background fieldset enables parallax.
    pub parallax: bool,
}

/// One `<option>` of a select control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Trimmed option text.
    pub label: String,
    /// `value` attribute, falling back to the label.
    pub value: String,
    /// Whether the option carries `selected`.
    pub selected: bool,
}

/// Options attached to a control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlOptions {
    /// Options of a `<select>`.
    Select(Vec<SelectOption>),
    /// Child inputs of a `<fieldset>`.
    Inputs(Vec<Control>),
}

/// A typed control extracted from the declaration block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Control {
    /// Control kind.
    pub kind: ControlKind,
    /// Parameter name the control edits (headers have none).
    #[serde(default)]
    pub name: Option<String>,
    /// Human-readable title.
    #[serde(default)]
    pub title: Option<String>,
    /// Raw default value as declared.
    #[serde(default)]
    pub value: Option<String>,
    /// Additional attributes.
    #[serde(default)]
    pub attrs: ControlAttrs,
    /// Select options or fieldset alternatives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<ControlOptions>,
}

impl Control {
    fn new(kind: ControlKind) -> Self {
        Self {
            kind,
            name: None,
            title: None,
            value: None,
            attrs: ControlAttrs::default(),
            options: None,
        }
    }

    /// Returns the select options, empty for other kinds.
    pub fn select_options(&self) -> &[SelectOption] {
        match &self.options {
            Some(ControlOptions::Select(options)) => options,
            _ => &[],
        }
    }

    /// Returns the fieldset child inputs, empty for other kinds.
    pub fn input_options(&self) -> &[Control] {
        match &self.options {
            Some(ControlOptions::Inputs(inputs)) => inputs,
            _ => &[],
        }
    }
}

/// Ordered controls of a component plus whether a declaration block exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Controls in declaration order.
    pub controls: Vec<Control>,
    /// Whether the template carries a declaration block.
    pub found: bool,
}

impl Schema {
    /// Number of extracted controls.
    pub fn count(&self) -> usize {
        self.controls.len()
    }

    /// Looks a control up by parameter name.
    pub fn control(&self, name: &str) -> Option<&Control> {
        self.controls
            .iter()
            .find(|control| control.name.as_deref() == Some(name))
    }
}

/// Coerces an HTML boolean attribute.
///
/// Absent and `"false"` are false; `""`, `"true"`, `"checked"` and any other
/// present value are true.
pub fn attr_bool(value: Option<&str>) -> bool {
    !matches!(value, None | Some("false"))
}

#[derive(Default)]
struct OptionDraft {
    label: String,
    value: Option<String>,
    selected: bool,
}

enum Draft {
    Header { control: Control, text: String },
    Input(Control),
    Select { control: Control, options: Vec<OptionDraft> },
    Fieldset { control: Control, inputs: Vec<Control> },
}

#[derive(Default)]
struct Collector {
    found: bool,
    drafts: Vec<Draft>,
}

type Shared = Rc<RefCell<Collector>>;

fn decode(raw: &str) -> String {
    html_escape::decode_html_entities(raw).into_owned()
}

fn attr(el: &lol_html::html_content::Element<'_, '_>, name: &str) -> Option<String> {
    el.get_attribute(name).map(|raw| decode(&raw))
}

fn non_empty_attr(el: &lol_html::html_content::Element<'_, '_>, name: &str) -> Option<String> {
    attr(el, name).filter(|value| !value.is_empty())
}

fn input_kind(el: &lol_html::html_content::Element<'_, '_>) -> ControlKind {
    let kind = attr(el, "type").unwrap_or_default().to_ascii_lowercase();
    if kind.is_empty() {
        ControlKind::Text
    } else {
        ControlKind::from_type(&kind)
    }
}

fn input_control(el: &lol_html::html_content::Element<'_, '_>) -> Control {
    let mut control = Control::new(input_kind(el));
    control.name = non_empty_attr(el, "name");
    control.title = non_empty_attr(el, "title");
    control.value = attr(el, "value");
    control.attrs = ControlAttrs {
        condition: non_empty_attr(el, "condition"),
        min: non_empty_attr(el, "min"),
        max: non_empty_attr(el, "max"),
        step: non_empty_attr(el, "step"),
        inline: attr_bool(attr(el, "inline").as_deref()),
        selected: attr_bool(attr(el, "selected").as_deref()),
        checked: attr_bool(attr(el, "checked").as_deref()),
        parallax: false,
    };
    control
}

/// Extracts the ordered control list from a template's declaration block.
///
/// A template without a declaration block yields an empty schema with
/// `found == false`. Later controls reusing an earlier control's name are
/// dropped with a warning so names stay unique.
pub fn parse_parameters(template: &str) -> Result<Schema, SchemaError> {
    let state: Shared = Rc::new(RefCell::new(Collector::default()));

    let block = state.clone();
    let header = state.clone();
    let header_text = state.clone();
    let input = state.clone();
    let select = state.clone();
    let option = state.clone();
    let option_text = state.clone();
    let fieldset = state.clone();
    let fieldset_input = state.clone();

    let handlers = vec![
        element!("mbr-parameters", move |_el| {
            block.borrow_mut().found = true;
            Ok(())
        }),
        element!("mbr-parameters > header", move |el| {
            let mut control = Control::new(ControlKind::Header);
            control.attrs.condition = non_empty_attr(el, "condition");
            header.borrow_mut().drafts.push(Draft::Header {
                control,
                text: String::new(),
            });
            Ok(())
        }),
        text!("mbr-parameters > header", move |chunk| {
            if let Some(Draft::Header { text, .. }) = header_text.borrow_mut().drafts.last_mut() {
                text.push_str(chunk.as_str());
            }
            Ok(())
        }),
        element!("mbr-parameters > input", move |el| {
            input.borrow_mut().drafts.push(Draft::Input(input_control(el)));
            Ok(())
        }),
        element!("mbr-parameters > select", move |el| {
            let mut control = Control::new(ControlKind::Select);
            control.name = non_empty_attr(el, "name");
            control.title = non_empty_attr(el, "title");
            select.borrow_mut().drafts.push(Draft::Select {
                control,
                options: Vec::new(),
            });
            Ok(())
        }),
        element!("mbr-parameters > select > option", move |el| {
            if let Some(Draft::Select { options, .. }) = option.borrow_mut().drafts.last_mut() {
                options.push(OptionDraft {
                    label: String::new(),
                    value: attr(el, "value"),
                    selected: attr_bool(attr(el, "selected").as_deref()),
                });
            }
            Ok(())
        }),
        text!("mbr-parameters > select > option", move |chunk| {
            if let Some(Draft::Select { options, .. }) = option_text.borrow_mut().drafts.last_mut()
                && let Some(current) = options.last_mut()
            {
                current.label.push_str(chunk.as_str());
            }
            Ok(())
        }),
        element!("mbr-parameters > fieldset", move |el| {
            let kind = attr(el, "type").unwrap_or_default().to_ascii_lowercase();
            let kind = if kind.is_empty() {
                ControlKind::Other("fieldset".to_string())
            } else {
                ControlKind::from_type(&kind)
            };
            let mut control = Control::new(kind);
            control.name = non_empty_attr(el, "name");
            control.title = control.name.clone();
            control.attrs.parallax = attr_bool(attr(el, "parallax").as_deref());
            fieldset.borrow_mut().drafts.push(Draft::Fieldset {
                control,
                inputs: Vec::new(),
            });
            Ok(())
        }),
        element!("mbr-parameters > fieldset > input", move |el| {
            if let Some(Draft::Fieldset { inputs, .. }) =
                fieldset_input.borrow_mut().drafts.last_mut()
            {
                let mut child = Control::new(input_kind(el));
                child.name = non_empty_attr(el, "name");
                child.title = non_empty_attr(el, "title");
                child.value = attr(el, "value");
                child.attrs.selected = attr_bool(attr(el, "selected").as_deref());
                child.attrs.condition = non_empty_attr(el, "condition");
                inputs.push(child);
            }
            Ok(())
        }),
    ];

    rewrite_str(
        template,
        RewriteStrSettings {
            element_content_handlers: handlers,
            ..RewriteStrSettings::new()
        },
    )
    .map_err(|err| SchemaError::Rewrite(err.to_string()))?;

    let collected = state.take();
    Ok(Schema {
        controls: finalize(collected.drafts),
        found: collected.found,
    })
}

fn finalize(drafts: Vec<Draft>) -> Vec<Control> {
    let mut seen = HashSet::new();
    let mut controls = Vec::with_capacity(drafts.len());

    for draft in drafts {
        let control = match draft {
            Draft::Header { mut control, text } => {
                control.title = Some(decode(text.trim()));
                control
            }
            Draft::Input(control) => control,
            Draft::Select {
                mut control,
                options,
            } => {
                let options: Vec<SelectOption> = options
                    .into_iter()
                    .map(|draft| {
                        let label = decode(draft.label.trim());
                        SelectOption {
                            value: draft.value.unwrap_or_else(|| label.clone()),
                            label,
                            selected: draft.selected,
                        }
                    })
                    .collect();
                control.value = options
                    .iter()
                    .find(|option| option.selected)
                    .or_else(|| options.first())
                    .map(|option| option.value.clone());
                control.options = Some(ControlOptions::Select(options));
                control
            }
            Draft::Fieldset { mut control, inputs } => {
                control.options = Some(ControlOptions::Inputs(inputs));
                control
            }
        };

        if let Some(name) = &control.name
            && !seen.insert(name.clone())
        {
            log::warn!("Dropping duplicate parameter control '{}'", name);
            continue;
        }
        controls.push(control);
    }

    controls
}
