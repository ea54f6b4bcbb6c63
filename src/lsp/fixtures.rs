//! Shared catalog used by the unit tests.

use tweaked_catalog::Catalog;

use super::symbol_index::SymbolIndex;

const SAMPLE_CATALOG: &str = r#"{
  "globals": [
    {
      "name": "print",
      "signature": "print(...: any): number",
      "description": "Prints values to the screen.",
      "parameters": [ { "name": "...", "type": "any", "description": "The values to print." } ],
      "returns": [ { "name": "lines", "type": "number", "description": "The number of lines printed." } ]
    },
    {
      "name": "sleep",
      "signature": "sleep(time: number)",
      "description": "Pauses execution.",
      "parameters": [ { "name": "time", "type": "number", "description": "Seconds to sleep." } ]
    }
  ],
  "modules": [
    {
      "name": "term",
      "description": "Terminal output.",
      "documentation": "Draws text on the computer's screen.",
      "functions": [
        {
          "name": "print",
          "signature": "term.print(text: string)",
          "description": "Prints text to the terminal.",
          "parameters": [ { "name": "text", "type": "string", "description": "The text." } ]
        },
        {
          "name": "clear",
          "signature": "term.clear()",
          "description": "Clears the terminal."
        },
        {
          "name": "setCursorPos",
          "signature": "term.setCursorPos(x: number, y: number)",
          "description": "Moves the cursor.",
          "parameters": [
            { "name": "x", "type": "number", "description": "Column." },
            { "name": "y", "type": "number", "description": "Row.", "optional": true }
          ],
          "returns": [],
          "example": "term.setCursorPos(1, 1)"
        }
      ]
    },
    {
      "name": "monitor",
      "description": "Attached monitor.",
      "documentation": "",
      "functions": [
        {
          "name": "clear",
          "signature": "monitor.clear()",
          "description": "Clears the monitor."
        },
        {
          "name": "setTextScale",
          "signature": "monitor.setTextScale(scale: number)",
          "description": "Sets the text scale.",
          "parameters": [ { "name": "scale", "type": "number", "description": "Scale from 0.5 to 5." } ],
          "returns": [ { "name": "ok", "type": "boolean", "description": "Whether it worked.", "optional": true } ]
        }
      ]
    }
  ]
}"#;

pub fn sample_catalog() -> Catalog {
    Catalog::from_json(SAMPLE_CATALOG).expect("sample catalog is valid")
}

pub fn sample_index() -> SymbolIndex {
    SymbolIndex::build(&sample_catalog())
}
