use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::config::ProtocolConfig;

/// One knowledge base's query form, as shipped in the `setup` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDescription {
    pub input: Vec<InputSpec>,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_url: Option<String>,
}

impl FormDescription {
    pub fn input(&self, name: &str) -> Option<&InputSpec> {
        self.input.iter().find(|input| input.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "ReadableName", default, skip_serializing_if = "Option::is_none")]
    pub readable_name: Option<String>,
    #[serde(rename = "Type")]
    pub input_type: InputType,
    #[serde(rename = "Categories", default)]
    pub categories: Vec<String>,
    #[serde(rename = "Min", default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(rename = "Max", default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl InputSpec {
    pub fn label(&self) -> &str {
        self.readable_name.as_deref().unwrap_or(self.name.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputType {
    LongString,
    ShortString,
    RequestType,
    Categorical,
    CategoricalMultiple,
    Boolean,
    Integer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    Single,
    Multi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorSpec {
    pub name: &'static str,
    pub select: SelectMode,
}

impl OperatorSpec {
    pub fn label(self) -> String {
        self.name.replace('_', " ")
    }
}

const REQUEST_TYPE_OPERATORS: [OperatorSpec; 1] = [OperatorSpec {
    name: "is_equal_to",
    select: SelectMode::Single,
}];

const CATEGORICAL_OPERATORS: [OperatorSpec; 2] = [
    OperatorSpec {
        name: "is_equal_to",
        select: SelectMode::Single,
    },
    OperatorSpec {
        name: "is_one_of",
        select: SelectMode::Multi,
    },
];

const CATEGORICAL_MULTIPLE_OPERATORS: [OperatorSpec; 4] = [
    OperatorSpec {
        name: "contains",
        select: SelectMode::Single,
    },
    OperatorSpec {
        name: "contain_all_of",
        select: SelectMode::Multi,
    },
    OperatorSpec {
        name: "contain_at_least_one_of",
        select: SelectMode::Multi,
    },
    OperatorSpec {
        name: "contains_not",
        select: SelectMode::Single,
    },
];

const INTEGER_OPERATORS: [OperatorSpec; 6] = [
    OperatorSpec {
        name: "is_equal_to",
        select: SelectMode::Single,
    },
    OperatorSpec {
        name: "is_greater_than",
        select: SelectMode::Single,
    },
    OperatorSpec {
        name: "is_at_least",
        select: SelectMode::Single,
    },
    OperatorSpec {
        name: "is_at_most",
        select: SelectMode::Single,
    },
    OperatorSpec {
        name: "is_less_than",
        select: SelectMode::Single,
    },
    OperatorSpec {
        name: "is_not",
        select: SelectMode::Single,
    },
];

pub fn operators(input_type: InputType) -> &'static [OperatorSpec] {
    match input_type {
        InputType::RequestType => &REQUEST_TYPE_OPERATORS,
        InputType::Categorical => &CATEGORICAL_OPERATORS,
        InputType::CategoricalMultiple => &CATEGORICAL_MULTIPLE_OPERATORS,
        InputType::Integer => &INTEGER_OPERATORS,
        InputType::LongString | InputType::ShortString | InputType::Boolean => &[],
    }
}

pub fn default_operator(input_type: InputType) -> Option<&'static str> {
    operators(input_type).first().map(|op| op.name)
}

pub fn operator_spec(input_type: InputType, name: &str) -> Option<OperatorSpec> {
    operators(input_type).iter().copied().find(|op| op.name == name)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Multi(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveField {
    pub id: String,
    pub field_name: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDatum {
    pub field_name: String,
    pub value: Option<FormValue>,
    pub operator: Option<String>,
}

/// Query form for one knowledge base. Required fields are always active and
/// keyed by their name; added constraints get a numeric id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryFormState {
    pub category: String,
    pub description: FormDescription,
    pub added_fields: Vec<ActiveField>,
    pub field_data: BTreeMap<String, FieldDatum>,
    next_field_id: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormAction {
    AddField { field_name: String },
    RemoveField { id: String },
    SetValue { id: String, value: FormValue },
    SetOperator { id: String, operator: String },
    Submit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEffect {
    SendMessage(String),
    MissingRequired(Vec<String>),
}

impl QueryFormState {
    pub fn new(category: impl Into<String>, description: FormDescription) -> Self {
        Self {
            category: category.into(),
            description,
            added_fields: Vec::new(),
            field_data: BTreeMap::new(),
            next_field_id: 0,
        }
    }

    pub fn active_fields(&self) -> Vec<ActiveField> {
        self.description
            .required
            .iter()
            .map(|name| ActiveField {
                id: name.clone(),
                field_name: name.clone(),
                required: true,
            })
            .chain(self.added_fields.iter().cloned())
            .collect()
    }

    /// Stored datum, or the initial one for a field nobody touched yet.
    pub fn datum(&self, field: &ActiveField) -> FieldDatum {
        if let Some(datum) = self.field_data.get(&field.id) {
            return datum.clone();
        }
        let operator = self
            .description
            .input(&field.field_name)
            .and_then(|input| default_operator(input.input_type))
            .map(str::to_string);
        FieldDatum {
            field_name: field.field_name.clone(),
            value: None,
            operator,
        }
    }

    fn active_field(&self, id: &str) -> Option<ActiveField> {
        self.active_fields().into_iter().find(|field| field.id == id)
    }
}

pub fn reduce_form(
    state: &mut QueryFormState,
    action: FormAction,
    protocol: &ProtocolConfig,
) -> Vec<FormEffect> {
    match action {
        FormAction::AddField { field_name } => {
            if state.description.input(&field_name).is_none() {
                tracing::debug!(field = %field_name, category = %state.category, "unknown form field");
                return Vec::new();
            }
            let id = state.next_field_id.to_string();
            state.next_field_id = state.next_field_id.saturating_add(1);
            state.added_fields.push(ActiveField {
                id,
                field_name,
                required: false,
            });
            Vec::new()
        }
        FormAction::RemoveField { id } => {
            let before = state.added_fields.len();
            state.added_fields.retain(|field| field.id != id);
            if state.added_fields.len() != before {
                state.field_data.remove(&id);
            }
            Vec::new()
        }
        FormAction::SetValue { id, value } => {
            if let Some(field) = state.active_field(&id) {
                let mut datum = state.datum(&field);
                datum.value = Some(value);
                state.field_data.insert(id, datum);
            }
            Vec::new()
        }
        FormAction::SetOperator { id, operator } => {
            let Some(field) = state.active_field(&id) else {
                return Vec::new();
            };
            let known = state
                .description
                .input(&field.field_name)
                .and_then(|input| operator_spec(input.input_type, &operator))
                .is_some();
            if !known {
                tracing::debug!(field = %field.field_name, operator = %operator, "unsupported operator");
                return Vec::new();
            }
            let mut datum = state.datum(&field);
            datum.operator = Some(operator);
            state.field_data.insert(id, datum);
            Vec::new()
        }
        FormAction::Submit => submit(state, protocol),
    }
}

fn submit(state: &QueryFormState, protocol: &ProtocolConfig) -> Vec<FormEffect> {
    let mut constraints = Vec::new();
    let mut missing = Vec::new();

    for field in state.active_fields() {
        let datum = state.datum(&field);
        let Some(value) = datum.value.as_ref() else {
            if field.required {
                missing.push(field.field_name.clone());
            }
            continue;
        };
        let input_type = state
            .description
            .input(&field.field_name)
            .map(|input| input.input_type);
        let unwrapped = input_type == Some(InputType::RequestType)
            || field.field_name == "RequestType";
        let operand = encode_operand(value);
        let expression = match datum.operator.as_deref() {
            Some(operator) if !unwrapped => format!("api.{operator}({operand})"),
            _ => operand,
        };
        let mut constraint = serde_json::Map::new();
        constraint.insert(field.field_name.clone(), Value::String(expression));
        constraints.push(Value::Object(constraint));
    }

    if !missing.is_empty() {
        return vec![FormEffect::MissingRequired(missing)];
    }

    let body = serde_json::json!({
        "db": state.category,
        "constraints": constraints,
    });
    vec![FormEffect::SendMessage(format!(
        "{}{}",
        protocol.front_to_back.query_prefix, body
    ))]
}

// The backend evaluates these as Python expressions.
fn encode_operand(value: &FormValue) -> String {
    match value {
        FormValue::Bool(true) => "True".to_string(),
        FormValue::Bool(false) => "False".to_string(),
        FormValue::Number(number) => format_number(*number),
        FormValue::Text(text) if text.trim().parse::<f64>().is_ok() => text.trim().to_string(),
        FormValue::Text(text) => Value::String(text.clone()).to_string(),
        FormValue::Multi(items) => serde_json::json!(items).to_string(),
    }
}

fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}
