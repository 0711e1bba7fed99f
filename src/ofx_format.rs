//! OFX 2 statement writer.
//!
//! Produces an OFX 2.2 bank statement response with one statement
//! transaction per record, ready for import into personal finance tools.

use crate::error::{Error, Result};
use crate::types::{Statement, TransactionRecord};
use chrono::NaiveDate;
use quick_xml::se::Serializer;
use serde::Serialize;
use std::io::Write;

/// Account type written to `BANKACCTFROM`.
const ACCOUNT_TYPE: &str = "CHECKING";

/// Represents an OFX statement.
#[derive(Debug, Clone, PartialEq)]
pub struct OfxStatement {
    /// The underlying statement data.
    pub statement: Statement,
}

impl OfxStatement {
    /// Write an OFX statement to any destination implementing `Write`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::fs::File;
    /// use chebanca_statement::ofx_format::OfxStatement;
    /// use chebanca_statement::types::Statement;
    ///
    /// let ofx = OfxStatement { statement: Statement::default() };
    /// let mut file = File::create("output.ofx")?;
    /// ofx.write_to(&mut file)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let document = self.to_document();

        let mut xml = String::new();
        let mut serializer = Serializer::new(&mut xml);
        serializer.indent(' ', 2);
        document
            .serialize(serializer)
            .map_err(|e| Error::XmlError(e.to_string()))?;

        writeln!(writer, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        writeln!(
            writer,
            "<?OFX OFXHEADER=\"200\" VERSION=\"220\" SECURITY=\"NONE\" \
             OLDFILEUID=\"NONE\" NEWFILEUID=\"NONE\"?>"
        )?;
        writeln!(writer, "{}", xml)?;

        Ok(())
    }

    fn to_document(&self) -> OfxDocument {
        let stmt = &self.statement;
        let now = chrono::Utc::now().format("%Y%m%d%H%M%S").to_string();

        OfxDocument {
            signon: SignonMessagesXml {
                sonrs: SignonResponseXml {
                    status: StatusXml::ok(),
                    dt_server: now,
                    language: "ITA".to_string(),
                },
            },
            bank: BankMessagesXml {
                stmt_trn_rs: StatementTransactionResponseXml {
                    trn_uid: "0".to_string(),
                    status: StatusXml::ok(),
                    stmt_rs: StatementResponseXml {
                        cur_def: stmt.currency.clone().unwrap_or_default(),
                        bank_acct_from: BankAccountXml {
                            bank_id: stmt.bank_id.clone().unwrap_or_default(),
                            acct_id: stmt.account_id.clone().unwrap_or_default(),
                            acct_type: ACCOUNT_TYPE.to_string(),
                        },
                        bank_tran_list: TransactionListXml {
                            dt_start: stmt.start_date.as_ref().map(format_ofx_date),
                            dt_end: stmt.end_date.as_ref().map(format_ofx_date),
                            stmt_trn: stmt.lines.iter().map(to_transaction_xml).collect(),
                        },
                    },
                },
            },
        }
    }
}

fn to_transaction_xml(line: &TransactionRecord) -> StatementTransactionXml {
    StatementTransactionXml {
        trn_type: line.trntype.code().to_string(),
        dt_posted: format_ofx_date(&line.date),
        dt_user: line.user_date.as_ref().map(format_ofx_date),
        trn_amt: line.amount.to_string(),
        fit_id: line.id.clone(),
        memo: line.memo.clone(),
        currency: line.currency.as_ref().map(|c| CurrencyXml {
            cur_sym: c.symbol.clone(),
        }),
    }
}

fn format_ofx_date(date: &NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

// OFX aggregate definitions
#[derive(Debug, Serialize)]
#[serde(rename = "OFX")]
struct OfxDocument {
    #[serde(rename = "SIGNONMSGSRSV1")]
    signon: SignonMessagesXml,
    #[serde(rename = "BANKMSGSRSV1")]
    bank: BankMessagesXml,
}

#[derive(Debug, Serialize)]
struct SignonMessagesXml {
    #[serde(rename = "SONRS")]
    sonrs: SignonResponseXml,
}

#[derive(Debug, Serialize)]
struct SignonResponseXml {
    #[serde(rename = "STATUS")]
    status: StatusXml,
    #[serde(rename = "DTSERVER")]
    dt_server: String,
    #[serde(rename = "LANGUAGE")]
    language: String,
}

#[derive(Debug, Serialize)]
struct StatusXml {
    #[serde(rename = "CODE")]
    code: u32,
    #[serde(rename = "SEVERITY")]
    severity: String,
}

impl StatusXml {
    fn ok() -> Self {
        Self {
            code: 0,
            severity: "INFO".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct BankMessagesXml {
    #[serde(rename = "STMTTRNRS")]
    stmt_trn_rs: StatementTransactionResponseXml,
}

#[derive(Debug, Serialize)]
struct StatementTransactionResponseXml {
    #[serde(rename = "TRNUID")]
    trn_uid: String,
    #[serde(rename = "STATUS")]
    status: StatusXml,
    #[serde(rename = "STMTRS")]
    stmt_rs: StatementResponseXml,
}

#[derive(Debug, Serialize)]
struct StatementResponseXml {
    #[serde(rename = "CURDEF")]
    cur_def: String,
    #[serde(rename = "BANKACCTFROM")]
    bank_acct_from: BankAccountXml,
    #[serde(rename = "BANKTRANLIST")]
    bank_tran_list: TransactionListXml,
}

#[derive(Debug, Serialize)]
struct BankAccountXml {
    #[serde(rename = "BANKID")]
    bank_id: String,
    #[serde(rename = "ACCTID")]
    acct_id: String,
    #[serde(rename = "ACCTTYPE")]
    acct_type: String,
}

#[derive(Debug, Serialize)]
struct TransactionListXml {
    #[serde(rename = "DTSTART", skip_serializing_if = "Option::is_none")]
    dt_start: Option<String>,
    #[serde(rename = "DTEND", skip_serializing_if = "Option::is_none")]
    dt_end: Option<String>,
    #[serde(rename = "STMTTRN")]
    stmt_trn: Vec<StatementTransactionXml>,
}

#[derive(Debug, Serialize)]
struct StatementTransactionXml {
    #[serde(rename = "TRNTYPE")]
    trn_type: String,
    #[serde(rename = "DTPOSTED")]
    dt_posted: String,
    #[serde(rename = "DTUSER", skip_serializing_if = "Option::is_none")]
    dt_user: Option<String>,
    #[serde(rename = "TRNAMT")]
    trn_amt: String,
    #[serde(rename = "FITID")]
    fit_id: String,
    #[serde(rename = "MEMO", skip_serializing_if = "Option::is_none")]
    memo: Option<String>,
    #[serde(rename = "CURRENCY", skip_serializing_if = "Option::is_none")]
    currency: Option<CurrencyXml>,
}

#[derive(Debug, Serialize)]
struct CurrencyXml {
    #[serde(rename = "CURSYM")]
    cur_sym: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::TransactionType;
    use crate::types::Currency;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn sample_statement() -> Statement {
        let mut statement = Statement {
            bank_id: Some("CHEBANCA".into()),
            account_id: Some("IT60X0542811101000000123456".into()),
            currency: Some("EUR".into()),
            ..Statement::default()
        };
        statement.add_line(TransactionRecord::new(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            Some(NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()),
            Some("Payment from X & Y".into()),
            Decimal::from_str("100.50").unwrap(),
            TransactionType::Xfer,
            Some(Currency::new("EUR"))
        ));
        statement
    }

    fn render(statement: Statement) -> String {
        let mut out = Vec::new();
        OfxStatement { statement }.write_to(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_write_ofx() {
        let statement = sample_statement();
        let id = statement.lines[0].id.clone();
        let xml = render(statement);

        assert!(xml.starts_with(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>"
        ));
        assert!(xml.contains("OFXHEADER=\"200\""));
        assert!(xml.contains("<OFX>"));
        assert!(xml.contains("<CURDEF>EUR</CURDEF>"));
        assert!(xml.contains("<BANKID>CHEBANCA</BANKID>"));
        assert!(xml.contains("<DTSTART>20230101</DTSTART>"));
        assert!(xml.contains("<TRNTYPE>XFER</TRNTYPE>"));
        assert!(xml.contains("<DTPOSTED>20230101</DTPOSTED>"));
        assert!(xml.contains("<DTUSER>20230102</DTUSER>"));
        assert!(xml.contains("<TRNAMT>100.50</TRNAMT>"));
        assert!(xml.contains(&format!("<FITID>{}</FITID>", id)));
        assert!(xml.contains("<MEMO>Payment from X &amp; Y</MEMO>"));
        assert!(xml.contains("<CURSYM>EUR</CURSYM>"));
    }

    #[test]
    fn test_write_empty_statement() {
        let xml = render(Statement::default());
        assert!(xml.contains("<BANKTRANLIST"));
        assert!(!xml.contains("<STMTTRN>"));
        assert!(!xml.contains("<DTSTART>"));
    }

    #[test]
    fn test_format_ofx_date() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 5).unwrap();
        assert_eq!(format_ofx_date(&date), "20241205");
    }
}
