//! Declarative validation and transformation rules for the registration form.
//!
//! A schema is an ordered list of field specs. Validation walks the fields in
//! declaration order, records at most one message per path, and only builds a
//! [`Submission`] when nothing failed.

pub mod errors;
pub mod messages;
pub mod rules;

use mime::APPLICATION_OCTET_STREAM;

use crate::storage::check_key;

use super::domain::{
    AvatarFile, FormVariant, RawSubmission, RawTech, SelectedFile, Submission, Tech,
};
pub use errors::{FieldPath, ValidationErrors};
pub use rules::{capitalize_words, KnowledgeFailure, KnowledgeRange, TextRule, TextTransform};

/// Deployment-specific inputs to schema construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaOptions {
    /// Domain suffix the profile variant requires, without `@`.
    pub email_domain: String,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            email_domain: "rocketseat.com.br".to_string(),
        }
    }
}

impl SchemaOptions {
    pub fn new(email_domain: impl Into<String>) -> Self {
        Self {
            email_domain: email_domain.into(),
        }
    }
}

/// Which text value of the raw record a [`TextField`] reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKey {
    Email,
    Password,
    Name,
}

impl TextKey {
    pub const fn path(self) -> &'static str {
        match self {
            TextKey::Email => "email",
            TextKey::Password => "password",
            TextKey::Name => "name",
        }
    }

    fn read(self, raw: &RawSubmission) -> Option<&str> {
        match self {
            TextKey::Email => raw.email.as_deref(),
            TextKey::Password => raw.password.as_deref(),
            TextKey::Name => raw.name.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextField {
    pub key: TextKey,
    pub rules: Vec<TextRule>,
    pub transforms: Vec<TextTransform>,
}

impl TextField {
    pub fn parse(&self, value: Option<&str>) -> Result<String, String> {
        parse_text(&self.rules, &self.transforms, value)
    }
}

/// Runs `rules` against `value`, then `transforms` on the survivor.
fn parse_text(
    rules: &[TextRule],
    transforms: &[TextTransform],
    value: Option<&str>,
) -> Result<String, String> {
    if let Some(message) = rules.iter().find_map(|rule| rule.check(value)) {
        return Err(message.to_string());
    }

    let value = value.unwrap_or_default().to_string();
    Ok(transforms
        .iter()
        .fold(value, |value, transform| transform.apply(value)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarField {
    pub required_message: String,
    /// The file name becomes the object key, so it must be a plain name.
    pub file_name_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechsField {
    pub title_rules: Vec<TextRule>,
    pub title_transforms: Vec<TextTransform>,
    pub knowledge: KnowledgeRange,
    pub knowledge_number_message: String,
    pub knowledge_range_message: String,
    pub min_items: usize,
    pub min_items_message: String,
}

impl TechsField {
    fn parse(&self, raw: &[RawTech], errors: &mut ValidationErrors) -> Option<Vec<Tech>> {
        let mut techs = Vec::with_capacity(raw.len());
        let mut failed = false;

        for (index, row) in raw.iter().enumerate() {
            let title = match parse_text(
                &self.title_rules,
                &self.title_transforms,
                row.title.as_deref(),
            ) {
                Ok(title) => Some(title),
                Err(message) => {
                    errors.push(FieldPath::tech(index, "title"), message);
                    None
                }
            };

            let knowledge = match self.knowledge.coerce(row.knowledge.as_ref()) {
                Ok(value) => Some(value),
                Err(KnowledgeFailure::NotANumber) => {
                    errors.push(
                        FieldPath::tech(index, "knowledge"),
                        self.knowledge_number_message.as_str(),
                    );
                    None
                }
                Err(KnowledgeFailure::OutOfRange) => {
                    errors.push(
                        FieldPath::tech(index, "knowledge"),
                        self.knowledge_range_message.as_str(),
                    );
                    None
                }
            };

            match (title, knowledge) {
                (Some(title), Some(knowledge)) => techs.push(Tech { title, knowledge }),
                _ => failed = true,
            }
        }

        if raw.len() < self.min_items {
            errors.push(FieldPath::field("techs"), self.min_items_message.as_str());
            failed = true;
        }

        (!failed).then_some(techs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSpec {
    Text(TextField),
    Avatar(AvatarField),
    Techs(TechsField),
}

/// Ordered field specs for one form variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionSchema {
    variant: FormVariant,
    fields: Vec<FieldSpec>,
}

impl SubmissionSchema {
    pub fn for_variant(variant: FormVariant, options: &SchemaOptions) -> Self {
        let mut fields = Vec::new();

        if variant.has_portfolio() {
            fields.push(FieldSpec::Avatar(AvatarField {
                required_message: messages::AVATAR_REQUIRED.to_string(),
                file_name_message: messages::AVATAR_FILE_NAME.to_string(),
            }));
        }

        if variant.has_name() {
            fields.push(FieldSpec::Text(TextField {
                key: TextKey::Name,
                rules: vec![TextRule::required(messages::NAME_REQUIRED)],
                transforms: vec![TextTransform::Trim, TextTransform::CapitalizeWords],
            }));
        }

        let mut email_rules = vec![
            TextRule::required(messages::EMAIL_REQUIRED),
            TextRule::email(messages::EMAIL_FORMAT),
        ];
        if variant == FormVariant::Profile {
            email_rules.push(TextRule::domain_suffix(
                &options.email_domain,
                messages::email_domain(&options.email_domain),
            ));
        }
        fields.push(FieldSpec::Text(TextField {
            key: TextKey::Email,
            rules: email_rules,
            transforms: vec![TextTransform::Lowercase],
        }));

        fields.push(FieldSpec::Text(TextField {
            key: TextKey::Password,
            rules: vec![
                TextRule::required(messages::PASSWORD_REQUIRED),
                TextRule::min_length(6, messages::PASSWORD_MIN_LENGTH),
            ],
            transforms: Vec::new(),
        }));

        if variant.has_portfolio() {
            fields.push(FieldSpec::Techs(TechsField {
                title_rules: vec![TextRule::required(messages::TECH_TITLE_REQUIRED)],
                title_transforms: vec![TextTransform::Trim],
                knowledge: KnowledgeRange { min: 1, max: 100 },
                knowledge_number_message: messages::TECH_KNOWLEDGE_NUMBER.to_string(),
                knowledge_range_message: messages::TECH_KNOWLEDGE_RANGE.to_string(),
                min_items: 2,
                min_items_message: messages::TECHS_MIN_COUNT.to_string(),
            }));
        }

        Self { variant, fields }
    }

    pub fn variant(&self) -> FormVariant {
        self.variant
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Validate and transform `raw`, or report every failing path.
    pub fn validate(&self, raw: &RawSubmission) -> Result<Submission, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut email = None;
        let mut password = None;
        let mut name = None;
        let mut avatar = None;
        let mut techs = None;

        for field in &self.fields {
            match field {
                FieldSpec::Text(text) => match text.parse(text.key.read(raw)) {
                    Ok(value) => match text.key {
                        TextKey::Email => email = Some(value),
                        TextKey::Password => password = Some(value),
                        TextKey::Name => name = Some(value),
                    },
                    Err(message) => errors.push(FieldPath::field(text.key.path()), message),
                },
                FieldSpec::Avatar(spec) => match raw.avatar.first() {
                    Some(file) if check_key(&file.name).is_err() => {
                        errors.push(FieldPath::field("avatar"), spec.file_name_message.as_str())
                    }
                    Some(file) => avatar = Some(resolve_avatar(file)),
                    None => errors.push(FieldPath::field("avatar"), spec.required_message.as_str()),
                },
                FieldSpec::Techs(spec) => techs = spec.parse(&raw.techs, &mut errors),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Submission {
            avatar,
            name,
            email: email.unwrap_or_default(),
            password: password.unwrap_or_default(),
            techs,
        })
    }
}

fn resolve_avatar(file: &SelectedFile) -> AvatarFile {
    let content_type = file
        .content_type
        .clone()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| {
            mime_guess::from_path(&file.name)
                .first()
                .map(|guess| guess.essence_str().to_string())
                .unwrap_or_else(|| APPLICATION_OCTET_STREAM.essence_str().to_string())
        });

    AvatarFile {
        name: file.name.clone(),
        size: file.bytes.len() as u64,
        content_type,
        bytes: file.bytes.clone(),
    }
}
