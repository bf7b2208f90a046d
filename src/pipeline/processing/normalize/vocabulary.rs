use serde::{Deserialize, Serialize};

/// The fixed set of semantic columns a sales list is expected to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    CompanyName,
    Industry,
    ContactPerson,
    Email,
    Phone,
    Address,
    Url,
    EmployeeCount,
    Revenue,
    EstablishedYear,
    GeneratedText,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 11] = [
        CanonicalField::CompanyName,
        CanonicalField::Industry,
        CanonicalField::ContactPerson,
        CanonicalField::Email,
        CanonicalField::Phone,
        CanonicalField::Address,
        CanonicalField::Url,
        CanonicalField::EmployeeCount,
        CanonicalField::Revenue,
        CanonicalField::EstablishedYear,
        CanonicalField::GeneratedText,
    ];

    /// Identifier used as the record key.
    pub fn id(self) -> &'static str {
        match self {
            CanonicalField::CompanyName => "company_name",
            CanonicalField::Industry => "industry",
            CanonicalField::ContactPerson => "contact_person",
            CanonicalField::Email => "email",
            CanonicalField::Phone => "phone",
            CanonicalField::Address => "address",
            CanonicalField::Url => "url",
            CanonicalField::EmployeeCount => "employee_count",
            CanonicalField::Revenue => "revenue",
            CanonicalField::EstablishedYear => "established_year",
            CanonicalField::GeneratedText => "generated_text",
        }
    }

    /// Human-readable column label, as written to exports.
    pub fn label(self) -> &'static str {
        match self {
            CanonicalField::CompanyName => "会社名",
            CanonicalField::Industry => "業種",
            CanonicalField::ContactPerson => "担当者",
            CanonicalField::Email => "メールアドレス",
            CanonicalField::Phone => "電話番号",
            CanonicalField::Address => "住所",
            CanonicalField::Url => "URL",
            CanonicalField::EmployeeCount => "従業員数",
            CanonicalField::Revenue => "売上高",
            CanonicalField::EstablishedYear => "設立年",
            CanonicalField::GeneratedText => "営業文面",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.id() == id)
    }
}

/// Localized header labels and the canonical field each one denotes.
/// Lookup is case-insensitive after width normalization; first entry wins.
pub const TRANSLATIONS: &[(&str, CanonicalField)] = &[
    ("会社名", CanonicalField::CompanyName),
    ("企業名", CanonicalField::CompanyName),
    ("社名", CanonicalField::CompanyName),
    ("業種", CanonicalField::Industry),
    ("業界", CanonicalField::Industry),
    ("担当者", CanonicalField::ContactPerson),
    ("担当者名", CanonicalField::ContactPerson),
    ("メールアドレス", CanonicalField::Email),
    ("メール", CanonicalField::Email),
    ("電話番号", CanonicalField::Phone),
    ("電話", CanonicalField::Phone),
    ("TEL", CanonicalField::Phone),
    ("住所", CanonicalField::Address),
    ("所在地", CanonicalField::Address),
    ("URL", CanonicalField::Url),
    ("ウェブサイト", CanonicalField::Url),
    ("HP", CanonicalField::Url),
    ("従業員数", CanonicalField::EmployeeCount),
    ("社員数", CanonicalField::EmployeeCount),
    ("売上", CanonicalField::Revenue),
    ("売上高", CanonicalField::Revenue),
    ("年商", CanonicalField::Revenue),
    ("設立年", CanonicalField::EstablishedYear),
    ("設立", CanonicalField::EstablishedYear),
    ("創業年", CanonicalField::EstablishedYear),
    ("営業文面", CanonicalField::GeneratedText),
];
