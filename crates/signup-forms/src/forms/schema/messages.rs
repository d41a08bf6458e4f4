//! User-facing validation messages (pt-BR).

pub const EMAIL_REQUIRED: &str = "O e-mail é obrigatório";
pub const EMAIL_FORMAT: &str = "Formato de email inválido";
pub const PASSWORD_REQUIRED: &str = "A senha é obrigatória";
pub const PASSWORD_MIN_LENGTH: &str = "A senha precisa de no mínimo 6 caracteres";
pub const NAME_REQUIRED: &str = "O nome é obrigatório";
pub const AVATAR_REQUIRED: &str = "O avatar é obrigatório";
pub const AVATAR_FILE_NAME: &str = "O nome do arquivo do avatar é inválido";
pub const TECH_TITLE_REQUIRED: &str = "O título é obrigatório";
pub const TECH_KNOWLEDGE_NUMBER: &str = "O conhecimento precisa ser um número";
pub const TECH_KNOWLEDGE_RANGE: &str = "O conhecimento precisa estar entre 1 e 100";
pub const TECHS_MIN_COUNT: &str = "Pelo menos 2 tecnologias devem ser informadas";

pub fn email_domain(domain: &str) -> String {
    format!("O e-mail precisa ser do domínio {domain}")
}
