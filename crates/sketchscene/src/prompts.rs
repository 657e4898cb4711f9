//! Instruction text sent to the generative transformations.

use sketchscene_parser::coercion::{NUMERIC_FIELDS, STRUCTURED_FIELDS};

/// First stage: describe the image as delimited text.
pub const IMAGE_TO_TEXT: &str = "\
You convert photographs of hand-drawn diagrams into Excalidraw elements.
Describe every shape, arrow, line and text in the image as CSV.

Rules:
- The first line is the header. Use these columns, in this order:
  id,type,x,y,width,height,angle,strokeColor,backgroundColor,fillStyle,\
strokeWidth,strokeStyle,roughness,opacity,groupIds,roundness,seed,version,\
isDeleted,boundElements,text,fontSize,fontFamily,textAlign,verticalAlign,\
points,startBinding,endBinding
- One line per element, in back-to-front drawing order.
- `type` is one of rectangle, ellipse, diamond, arrow, line, text.
- Coordinates are in pixels with the origin at the top left.
- Wrap any cell that contains a comma in double quotes.
- Write lists and objects with single quotes, for example [[0, 0], [120, 40]]
  or {'elementId': 'box-1', 'focus': 0, 'gap': 4}.
- Leave a cell empty when it does not apply.
- Answer with the CSV only, no commentary.";

/// Second stage: review and complete the first answer.
pub const SELF_REVIEW: &str = "\
Compare your CSV with the image again. Add any element you missed, fix \
positions and sizes that are off, and make sure every arrow's points and \
bindings match the shapes it connects. Keep the same header. Answer with \
the complete corrected CSV only.";

/// Build the first repair request for a serialized candidate document.
pub fn repair_request(candidate: &str) -> String {
    format!(
        "The following Excalidraw document must be valid JSON. Fix any syntax \
         errors without changing its content. Numeric fields ({numeric}) must be \
         numbers; {structured} must be JSON arrays, objects or null.\n\
         Respond with the JSON document only: no code fences, no surrounding \
         quotes and no escaped newlines.\n\n{candidate}",
        numeric = NUMERIC_FIELDS.join(", "),
        structured = STRUCTURED_FIELDS.join(", "),
    )
}

/// Build the corrective follow-up after a response failed to parse.
pub fn repair_correction(error: &str) -> String {
    format!(
        "Your response is not valid JSON: {error}\n\
         Send the corrected document again as a single JSON object. Do not wrap \
         it in quotes, do not escape quotes and do not include newline escapes."
    )
}
