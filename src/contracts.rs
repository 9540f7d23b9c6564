//! Shariah contract document generation
//!
//! Pure text rendering: a loan plus its client in, an HTML contract out.
//! Each contract structure gets its own clauses; unknown template names
//! fall back to a generic financing agreement. Loan and client are
//! optional so blank templates can be previewed before a loan exists;
//! absent values render as fill-in blanks.

use chrono::Utc;
use rust_decimal::Decimal;

use crate::models::{Client, Loan};

const BLANK: &str = "____________";

/// Render the contract document for a loan under the named template.
///
/// Template names follow `ShariahContract::as_str`; anything else renders
/// the generic agreement.
pub fn generate_contract(
    template_type: &str,
    loan: Option<&Loan>,
    client: Option<&Client>,
) -> String {
    let body = match template_type {
        "murabaha" => murabaha_clauses(loan),
        "qard_hassan" => qard_hassan_clauses(),
        "musharakah" => musharakah_clauses(loan),
        "wadiah" => wadiah_clauses(),
        _ => generic_clauses(loan),
    };

    let title = contract_title(template_type);
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{title} - {contract_number}</title></head>
<body>
<h1>{title}</h1>
<p>Contract Number: <strong>{contract_number}</strong></p>
<p>Date: {date}</p>
<h2>Parties</h2>
<p>Customer: {customer} ({id_type} {id_number})</p>
<h2>Financing Terms</h2>
<ul>
<li>Collateral value: MYR {gold_value}</li>
<li>Financing amount: MYR {financing}</li>
<li>Financing ratio: {ratio}</li>
<li>Term: {term} months</li>
</ul>
{body}
<h2>Signatures</h2>
<p>Customer: _______________________</p>
<p>Authorized Officer: _______________________</p>
</body>
</html>"#,
        title = title,
        contract_number = text_or_blank(loan.map(|l| l.contract_number.clone())),
        date = Utc::now().format("%Y-%m-%d"),
        customer = text_or_blank(client.map(|c| c.full_name.clone())),
        id_type = text_or_blank(client.map(|c| c.identification_type.clone())),
        id_number = text_or_blank(client.map(|c| c.identification_number.clone())),
        gold_value = decimal_or_blank(loan.map(|l| l.total_gold_value)),
        financing = decimal_or_blank(loan.map(|l| l.financing_amount)),
        ratio = decimal_or_blank(loan.map(|l| l.financing_ratio)),
        term = text_or_blank(loan.map(|l| l.term_months.to_string())),
        body = body,
    )
}

fn text_or_blank(value: Option<String>) -> String {
    value.unwrap_or_else(|| BLANK.to_string())
}

fn decimal_or_blank(value: Option<Decimal>) -> String {
    value.map_or_else(|| BLANK.to_string(), |d| d.to_string())
}

fn contract_title(template_type: &str) -> &'static str {
    match template_type {
        "murabaha" => "Murabaha Gold Financing Agreement",
        "qard_hassan" => "Qard Hassan Benevolent Loan Agreement",
        "musharakah" => "Musharakah Partnership Agreement",
        "wadiah" => "Wadiah Safekeeping Agreement",
        _ => "Gold Financing Agreement",
    }
}

fn murabaha_clauses(loan: Option<&Loan>) -> String {
    format!(
        "<h2>Murabaha Structure</h2>\
         <p>The institution purchases the pledged gold and resells it to the \
         customer at a disclosed profit rate of {}% per annum, payable over \
         the financing term in agreed installments.</p>",
        decimal_or_blank(loan.map(|l| l.profit_rate))
    )
}

fn qard_hassan_clauses() -> String {
    "<h2>Qard Hassan Structure</h2>\
     <p>This is a benevolent loan. The customer repays only the principal \
     amount; no profit, interest or charge beyond actual administrative \
     cost is levied.</p>"
        .to_string()
}

fn musharakah_clauses(loan: Option<&Loan>) -> String {
    format!(
        "<h2>Musharakah Structure</h2>\
         <p>The institution and the customer jointly own the pledged gold in \
         proportion to their contributions. Profit is shared at the agreed \
         rate of {}% per annum; losses are borne in proportion to capital.</p>",
        decimal_or_blank(loan.map(|l| l.profit_rate))
    )
}

fn wadiah_clauses() -> String {
    "<h2>Wadiah Structure</h2>\
     <p>The pledged gold is held in safe custody by the institution for the \
     duration of the financing and returned upon full settlement.</p>"
        .to_string()
}

fn generic_clauses(loan: Option<&Loan>) -> String {
    format!(
        "<h2>Structure</h2>\
         <p>Shariah-compliant gold financing under the {} contract at a \
         profit rate of {}% per annum.</p>",
        text_or_blank(loan.map(|l| l.shariah_contract.as_str().to_string())),
        decimal_or_blank(loan.map(|l| l.profit_rate)),
    )
}

/// Default document name for a generated contract; named from the
/// requested template, which may differ from the loan's own structure.
pub fn contract_document_name(template_type: &str, contract_number: &str) -> String {
    format!("{}-{}.html", template_type, contract_number)
}
