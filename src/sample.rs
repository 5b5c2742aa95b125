//! Canned extraction response for [`crate::config::ExtractionMode::Sample`].
//!
//! Shaped like a real reply from the service: direct Markdown, two chunking
//! methods, schema output, one pre-rendered table and plan usage. It lets
//! the whole pipeline run without an API key or network access.

use crate::output::ExtractionResult;

/// Raw JSON of the sample response.
pub const SAMPLE_RESPONSE: &str = r###"{
  "markdown": "# Sample Purchase Order\n\n**Example Company Inc**  \n123 Main Street  \nUnit 2  \nBoston Massachusetts 02101  \nUSA\n\n---\n\n**Purchase Order**  \n**# PO-12345**",
  "chunking": {
    "recursive": [
      {
        "chunk_number": 1,
        "content": "# Sample Purchase Order",
        "length": 29,
        "method": "recursive"
      },
      {
        "chunk_number": 2,
        "content": "**Example Company Inc**  \n123 Main Street  \nUnit 2  \nBoston Massachusetts 02101",
        "length": 95,
        "method": "recursive"
      }
    ],
    "semantic": [
      {
        "chunk_number": 1,
        "content": "Sample Purchase Order from Example Company Inc located at 123 Main Street, Unit 2, Boston Massachusetts 02101",
        "length": 112,
        "method": "semantic"
      }
    ]
  },
  "schema-json": {
    "company": "Example Company Inc",
    "purchase_order_number": "PO-12345",
    "address": {
      "street": "123 Main Street",
      "unit": "Unit 2",
      "city": "Boston",
      "state": "Massachusetts",
      "zip": "02101",
      "country": "USA"
    }
  },
  "tables": [
    {
      "table_id": 1,
      "content": "| # | Item & Description | Qty | Rate | Amount |\n|----|-------------------|------|----------|----------|\n| 1 | Setup Fee | 1.00 | 1,000.00 | 1,000.00 |\n| 2 | Product A | 50.00| 30.00 | 1,500.00 |"
    }
  ],
  "plan-info": {
    "pages_used": 19998,
    "tier": "foundation"
  }
}"###;

/// The sample response, parsed.
pub fn sample_result() -> ExtractionResult {
    ExtractionResult::from_json(SAMPLE_RESPONSE).unwrap_or_default()
}
