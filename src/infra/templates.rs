use async_trait::async_trait;

use crate::app::ports::TextGenerator;
use crate::error::GenerationFailure;
use crate::types::Record;

const TEMPLATES: [&str; 3] = [
    "株式会社{company_name}様\n\n平素より格別のご高配を賜り、誠にありがとうございます。\n\n弊社の業務効率化ソリューションは、{industry}業界での実績が豊富であり、御社の課題解決に最適なツールとなります。特に、従業員数{employee_count}名規模の企業様では、導入後3ヶ月で平均30%の業務効率化を実現しております。\n\n是非一度、オンラインデモをご覧いただければ幸いです。ご連絡お待ちしております。",
    "{company_name}様\n\n貴社のますますのご発展を心よりお喜び申し上げます。\n\n弊社は{industry}業界に特化したコンサルティングサービスを提供しており、売上{revenue}百万円規模の企業様に対して、売上向上のための戦略立案をサポートしております。\n\n{contact_person}様のお時間を頂戴できれば、貴社の課題に合わせたご提案をさせていただきます。",
    "{company_name}様\n\n拝啓 時下ますますご清栄のこととお慶び申し上げます。\n\n弊社では、{established_year}年創業の老舗企業様向けに、伝統と革新を両立させるデジタル変革支援を行っております。{industry}業界での豊富な実績を基に、貴社の価値を最大化するソリューションをご提案いたします。\n\n詳細資料をお送りいたしますので、ご検討いただければ幸いです。敬具",
];

/// Deterministic local generator: fills one of the fixed prose templates
/// with the record's values.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateGenerator;

impl TemplateGenerator {
    /// Same record id, same template.
    fn template_for(record: &Record) -> &'static str {
        let seed = record
            .id
            .bytes()
            .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
        TEMPLATES[seed % TEMPLATES.len()]
    }

    /// Replaces `{field}` for every non-empty field; other placeholders stay as written.
    pub fn render(&self, record: &Record) -> String {
        let mut text = Self::template_for(record).to_string();
        for key in record.fields.keys() {
            let placeholder = format!("{{{key}}}");
            if !text.contains(&placeholder) {
                continue;
            }
            match record.display(key) {
                Some(value) if !value.is_empty() => text = text.replace(&placeholder, &value),
                _ => {}
            }
        }
        text
    }
}

#[async_trait]
impl TextGenerator for TemplateGenerator {
    async fn generate(&self, record: &Record) -> Result<String, GenerationFailure> {
        Ok(self.render(record))
    }

    fn name(&self) -> &'static str {
        "template"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_is_deterministic_and_fills_fields() {
        let record = Record::new("abc")
            .with_field("company_name", "テスト株式会社")
            .with_field("industry", "IT")
            .with_field("employee_count", 100.0)
            .with_field("revenue", 500.0)
            .with_field("contact_person", "山田太郎")
            .with_field("established_year", 2010.0);

        let first = TemplateGenerator.render(&record);
        assert_eq!(first, TemplateGenerator.render(&record));
        assert!(first.contains("テスト株式会社様"));
        assert!(first.contains("IT業界"));
        assert!(!first.contains('{'));
    }

    #[test]
    fn test_missing_fields_leave_placeholders() {
        let record = Record::new("abc").with_field("industry", crate::types::CellValue::Null);
        let text = TemplateGenerator.render(&record);
        assert!(text.contains("{company_name}"));
        assert!(text.contains("{industry}"));
    }

    #[test]
    fn test_every_template_is_reachable() {
        let mut seen = std::collections::HashSet::new();
        for i in 0..64 {
            seen.insert(TemplateGenerator::template_for(&Record::new(format!("id-{i}"))));
        }
        assert_eq!(seen.len(), TEMPLATES.len());
    }

    #[tokio::test]
    async fn test_generate_never_fails() {
        let text = TemplateGenerator.generate(&Record::new("x")).await.unwrap();
        assert!(!text.is_empty());
    }
}
