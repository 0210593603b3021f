//! Prompt templates for resume generation and editing.
//!
//! Placeholders are `{name}` tokens substituted with plain string replace —
//! the inputs are prose and LaTeX, not structured data.

pub const GENERATION_SYSTEM: &str = "You are an expert resume writer and LaTeX professional. \
You produce complete, valid LaTeX documents and nothing else: no commentary, \
no Markdown fences, no partial snippets.";

pub const GENERATION_PROMPT_TEMPLATE: &str = r#"Take the provided user information and fill it into the provided LaTeX template to create an ATS-friendly resume.

USER INFORMATION:
Role: {role}
Skills: {skills}
Experience: {experience}

LATEX TEMPLATE:
{template_latex}

INSTRUCTIONS:
1. Keep the structure of the template exactly as is.
2. Replace the placeholder content with the user's information, optimized for the role.
3. Use professional, formal language.
4. Ensure all LaTeX syntax is valid.
5. Return ONLY the full valid LaTeX code.
"#;

pub const EDIT_SYSTEM: &str = "You are an expert resume editor working directly on LaTeX source. \
You return the complete modified document and nothing else: no commentary, \
no Markdown fences.";

pub const EDIT_PROMPT_TEMPLATE: &str = r#"Modify the provided LaTeX resume code based on the user's instruction.

CURRENT LATEX:
{current_latex}

INSTRUCTION:
{instruction}

REQUIREMENTS:
1. Modify only the parts relevant to the instruction.
2. Ensure the resulting LaTeX is valid and capable of compiling.
3. Do not change the overall template structure unless asked.
4. Return ONLY the full valid LaTeX code.
"#;
