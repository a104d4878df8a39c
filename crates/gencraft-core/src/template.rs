//! Prompt templates and the placeholder renderer.
//!
//! Templates use triple-brace placeholders (`{{{projectIdea}}}`). Rendering
//! is literal substitution: no escaping, no conditionals. Field values longer
//! than the template's limit are cut to that many characters and
//! [`TRUNCATION_MARKER`] is appended.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

/// Appended to any field value cut at its template's limit.
pub const TRUNCATION_MARKER: &str = "\n...";

/// Named field values substituted into a template.
pub type PromptFields = BTreeMap<String, String>;

pub const FIELD_PROJECT_IDEA: &str = "projectIdea";
pub const FIELD_PROJECT_PLAN: &str = "projectPlan";
pub const FIELD_FLOWCHART: &str = "flowchart";
pub const FIELD_STRATEGIC_ADVICE: &str = "strategicAdvice";
pub const FIELD_GENERATED_CODE: &str = "generatedCode";
pub const FIELD_PROJECT_INSIGHTS: &str = "projectInsights";

/// Errors raised while rendering a template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("template {template} references field {field} which was not supplied")]
    MissingField {
        template: &'static str,
        field: String,
    },

    #[error("unknown template: {name}")]
    UnknownTemplate { name: String },
}

/// Identifies one of the built-in prompt templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateId {
    Plan,
    Flowchart,
    CodeFromFlowchart,
    CodeFromAdvice,
    Image,
    Insights,
    Advice,
    Review,
    Theme,
}

impl TemplateId {
    pub const ALL: [TemplateId; 9] = [
        TemplateId::Plan,
        TemplateId::Flowchart,
        TemplateId::CodeFromFlowchart,
        TemplateId::CodeFromAdvice,
        TemplateId::Image,
        TemplateId::Insights,
        TemplateId::Advice,
        TemplateId::Review,
        TemplateId::Theme,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TemplateId::Plan => "plan",
            TemplateId::Flowchart => "flowchart",
            TemplateId::CodeFromFlowchart => "code",
            TemplateId::CodeFromAdvice => "code-from-advice",
            TemplateId::Image => "image",
            TemplateId::Insights => "insights",
            TemplateId::Advice => "advice",
            TemplateId::Review => "review",
            TemplateId::Theme => "theme",
        }
    }

    /// Per-field character limit applied before substitution.
    pub fn max_field_chars(&self) -> usize {
        match self {
            TemplateId::Insights => 500,
            TemplateId::Image | TemplateId::Review => 1000,
            TemplateId::Plan
            | TemplateId::Flowchart
            | TemplateId::CodeFromFlowchart
            | TemplateId::CodeFromAdvice
            | TemplateId::Advice
            | TemplateId::Theme => 2000,
        }
    }

    /// Fields cut to [`max_field_chars`](Self::max_field_chars) before
    /// substitution. Templates that take generated code only limit the code.
    pub fn truncated_fields(&self) -> &'static [&'static str] {
        match self {
            TemplateId::Image | TemplateId::Insights | TemplateId::Review => {
                &[FIELD_GENERATED_CODE]
            }
            _ => self.fields(),
        }
    }

    /// Field names this template expects.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            TemplateId::Plan | TemplateId::Flowchart | TemplateId::Theme => &[FIELD_PROJECT_IDEA],
            TemplateId::CodeFromFlowchart => {
                &[FIELD_PROJECT_IDEA, FIELD_PROJECT_PLAN, FIELD_FLOWCHART]
            }
            TemplateId::CodeFromAdvice => {
                &[FIELD_PROJECT_IDEA, FIELD_PROJECT_PLAN, FIELD_STRATEGIC_ADVICE]
            }
            TemplateId::Image => &[FIELD_PROJECT_IDEA, FIELD_GENERATED_CODE],
            TemplateId::Insights => &[FIELD_PROJECT_IDEA, FIELD_PROJECT_PLAN, FIELD_GENERATED_CODE],
            TemplateId::Advice => &[FIELD_PROJECT_IDEA, FIELD_PROJECT_PLAN],
            TemplateId::Review => &[
                FIELD_PROJECT_IDEA,
                FIELD_PROJECT_PLAN,
                FIELD_GENERATED_CODE,
                FIELD_PROJECT_INSIGHTS,
            ],
        }
    }

    pub fn body(&self) -> &'static str {
        match self {
            TemplateId::Plan => PLAN_TEMPLATE,
            TemplateId::Flowchart => FLOWCHART_TEMPLATE,
            TemplateId::CodeFromFlowchart => CODE_FROM_FLOWCHART_TEMPLATE,
            TemplateId::CodeFromAdvice => CODE_FROM_ADVICE_TEMPLATE,
            TemplateId::Image => IMAGE_TEMPLATE,
            TemplateId::Insights => INSIGHTS_TEMPLATE,
            TemplateId::Advice => ADVICE_TEMPLATE,
            TemplateId::Review => REVIEW_TEMPLATE,
            TemplateId::Theme => THEME_TEMPLATE,
        }
    }
}

impl std::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TemplateId {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TemplateId::ALL
            .into_iter()
            .find(|id| id.name() == s)
            .ok_or_else(|| TemplateError::UnknownTemplate {
                name: s.to_string(),
            })
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{\{\s*([A-Za-z0-9_]+)\s*\}\}\}").expect("placeholder pattern compiles")
    })
}

/// Cut `value` to `max` characters and append the marker, or borrow it unchanged.
pub fn truncate_field(value: &str, max: usize) -> Cow<'_, str> {
    match value.char_indices().nth(max) {
        Some((byte_index, _)) => {
            let mut cut = String::with_capacity(byte_index + TRUNCATION_MARKER.len());
            cut.push_str(&value[..byte_index]);
            cut.push_str(TRUNCATION_MARKER);
            Cow::Owned(cut)
        }
        None => Cow::Borrowed(value),
    }
}

/// Render a built-in template with its default field limit.
pub fn build(id: TemplateId, fields: &PromptFields) -> Result<String, TemplateError> {
    build_with_limit(id, fields, id.max_field_chars())
}

/// Render a built-in template with an explicit field limit.
pub fn build_with_limit(
    id: TemplateId,
    fields: &PromptFields,
    max_field_chars: usize,
) -> Result<String, TemplateError> {
    render(
        id.name(),
        id.body(),
        fields,
        id.truncated_fields(),
        max_field_chars,
    )
}

/// Substitute every placeholder in `body`.
///
/// Every referenced field must be present in `fields`; extra fields are
/// ignored. Only fields named in `truncated` are cut to `max_field_chars`.
/// Substituted text is never rescanned, so values containing braces are
/// inserted literally.
pub fn render(
    template: &'static str,
    body: &str,
    fields: &PromptFields,
    truncated: &[&str],
    max_field_chars: usize,
) -> Result<String, TemplateError> {
    let pattern = placeholder_pattern();

    for caps in pattern.captures_iter(body) {
        let name = &caps[1];
        if !fields.contains_key(name) {
            return Err(TemplateError::MissingField {
                template,
                field: name.to_string(),
            });
        }
    }

    let rendered = pattern.replace_all(body, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        match fields.get(name) {
            Some(value) if truncated.contains(&name) => {
                truncate_field(value, max_field_chars).into_owned()
            }
            Some(value) => value.clone(),
            None => String::new(),
        }
    });
    Ok(rendered.into_owned())
}

const PLAN_TEMPLATE: &str = "You are a project manager who is good at creating project plans with milestones.

Given the project idea, create a project plan with 3 milestones.

Project Idea: {{{projectIdea}}}";

const FLOWCHART_TEMPLATE: &str = r##"You are an expert in creating flowchart diagrams for software projects.

Based on the following project idea, generate a flowchart diagram as a self-contained SVG string that visualizes the project workflow.
Project Idea: {{{projectIdea}}}

The SVG should be well-formed and valid.
It should use standard SVG elements like <rect>, <text>, <line>, and <path>.
Nodes should typically be rectangles with text inside. Use appropriate font sizes and padding for readability.
Edges should be lines or paths, preferably with arrowheads indicating direction.
The SVG must include an appropriate viewBox, for example: '0 0 600 400'.
Ensure all text is clearly visible against node backgrounds.
Do not include any JavaScript, <script> tags, or other interactive elements within the SVG. Focus solely on static visual representation.
Do not include any explanation, preamble, or any text outside the <svg>...</svg> tags. Only output the SVG string.

When styling, use fill and stroke attributes with HSL CSS variables for colors (e.g., fill="hsl(var(--card))", stroke="hsl(var(--primary))") so the flowchart adapts to the application's theme.
The style block should look like this:
<style>
  .node-rect { fill: hsl(var(--card)); stroke: hsl(var(--primary)); stroke-width: 2; rx: 5; }
  .node-text { fill: hsl(var(--card-foreground)); font-family: sans-serif; font-size: 14px; text-anchor: middle; dominant-baseline: middle; }
  .edge-line { stroke: hsl(var(--foreground)); stroke-width: 2; }
  .arrowhead-fill { fill: hsl(var(--foreground)); }
</style>
And arrowheads should use a class for their fill, like <path d="..." class="arrowhead-fill" />

Here is an example of a simple, valid SVG flowchart using literal colors for reference of structure (use HSL variables as described above for the actual output):
<svg viewBox="0 0 600 400" xmlns="http://www.w3.org/2000/svg">
  <style>
    .node-rect { fill: #FFFFFF; stroke: #007bff; stroke-width: 2; rx: 5; }
    .node-text { fill: #333333; font-family: sans-serif; font-size: 14px; text-anchor: middle; dominant-baseline: middle; }
    .edge-line { stroke: #333333; stroke-width: 2; }
    .arrowhead-fill { fill: #333333; }
  </style>
  <defs>
    <marker id="arrowhead" markerWidth="10" markerHeight="7" refX="9" refY="3.5" orient="auto" markerUnits="strokeWidth">
      <path d="M0,0 L10,3.5 L0,7 Z" class="arrowhead-fill" />
    </marker>
  </defs>
  <g>
    <rect x="50" y="50" width="120" height="60" class="node-rect" />
    <text x="110" y="80" class="node-text">Start</text>
    <rect x="240" y="150" width="120" height="60" class="node-rect" />
    <text x="300" y="180" class="node-text">Process Data</text>
    <rect x="430" y="250" width="120" height="60" class="node-rect" />
    <text x="490" y="280" class="node-text">End</text>
    <line x1="110" y1="110" x2="300" y2="150" class="edge-line" marker-end="url(#arrowhead)" />
    <line x1="300" y1="210" x2="490" y2="250" class="edge-line" marker-end="url(#arrowhead)" />
  </g>
</svg>"##;

/// Instructions shared by both code templates.
macro_rules! code_rules {
    () => {
        r#"
Your task is to:
1.  Generate multiple React component files (.tsx). These should include a main page component (e.g., `src/app/page.tsx`) and any necessary sub-components. Each file should be complete, runnable, and adhere to modern React best practices.
    *   For each file, provide a fully qualified `fileName` (e.g., `src/components/feature-card.tsx`) and its `fileContent`.
    *   Ensure components are functional, use TypeScript, and import types correctly.
    *   Utilize ShadCN UI components (e.g., <Button>, <Card>) where appropriate for UI elements.
    *   Use `lucide-react` for icons if needed.
    *   Use `https://placehold.co/<width>x<height>.png` for placeholder images and include `data-ai-hint` attributes with 1-2 keywords.
2.  Generate global CSS styles or Tailwind CSS utility class recommendations suitable for the project. This should be a single string for the `globalStyles` field. If no specific global styles are needed beyond default Tailwind, provide an empty string or a comment like "/* Tailwind CSS utilities will be primarily used. */".
3.  The output MUST be a JSON object adhering to the specified output schema. Do NOT include any explanations, comments outside the code, or markdown formatting around the JSON.
4.  Ensure every component returns a single root JSX element.

Output ONLY the JSON object."#
    };
}

const CODE_FROM_FLOWCHART_TEMPLATE: &str = concat!(
    "You are a senior full-stack developer specializing in Next.js (App Router) and React, tasked with generating a complete set of starter files for a web application.

Project Idea: {{{projectIdea}}}
Project Plan: {{{projectPlan}}}
Flowchart (SVG):
{{{flowchart}}}
",
    code_rules!()
);

const CODE_FROM_ADVICE_TEMPLATE: &str = concat!(
    "You are a senior full-stack developer specializing in Next.js (App Router) and React, tasked with generating a complete set of starter files for a web application.
Let the strategic advice shape which features you build first.

Project Idea: {{{projectIdea}}}
Project Plan: {{{projectPlan}}}
Strategic Advice (JSON):
{{{strategicAdvice}}}
",
    code_rules!()
);

const IMAGE_TEMPLATE: &str = r#"You are a UI/UX designer. Your task is to create a conceptual visual representation of a web application's user interface.
Project Idea: "{{{projectIdea}}}"
Generated React Code Snippet (first 1000 characters):
```jsx
{{{generatedCode}}}
```

Based on the project idea and the provided code snippet, generate a single, clean, visually appealing mockup or a conceptual, screenshot-like image of what a simple UI for this application might look like.
The style should be modern, minimalist, and suitable for a web application.
If the code suggests specific UI elements (buttons, forms, lists, cards), try to incorporate abstract representations of them.
Do NOT include any actual code text or code syntax highlighting in the image itself. Focus purely on the visual layout and user interface elements.
Ensure the image is safe for all audiences."#;

const INSIGHTS_TEMPLATE: &str = r#"You are an AI assistant that provides helpful insights about a software project.
Based on the project idea, plan, and a code snippet, generate the following:
1.  Estimated Complexity: A simple classification like "Simple", "Medium", or "Complex".
2.  Suggested Keywords: 2-3 keywords that are relevant to the project's domain or potential technologies.
3.  Fun Fact or Tip: A brief, interesting fact or a helpful development tip related to the project idea.

Project Idea: {{{projectIdea}}}
Project Plan: {{{projectPlan}}}
Generated Code Snippet:
```
{{{generatedCode}}}
```

Provide the output in the structured format defined."#;

const ADVICE_TEMPLATE: &str = r#"You are an experienced CTO and project strategist. You are tasked with providing strategic advice on a new project before any code is written.
Review the idea and the generated plan and offer concise, high-level strategic advice.

Project Idea: {{{projectIdea}}}

Project Plan (JSON):
{{{projectPlan}}}

Based on the above, provide:
1.  keyConsideration: A critical factor or key aspect for the project's success.
2.  nextStepSuggestion: A logical next step to advance the project.
3.  potentialChallenge: A significant potential challenge or risk.
4.  longTermThought: A forward-looking thought on the project's long-term potential or evolution.

Output ONLY the JSON object adhering to the schema."#;

const REVIEW_TEMPLATE: &str = r#"You are an experienced CTO and project strategist. You are tasked with providing "deep think" strategic advice based on a project's initial idea, generated plan, code snippets, and preliminary insights.
Review all the provided information and offer concise, high-level strategic advice.

Project Idea: {{{projectIdea}}}

Project Plan (JSON):
{{{projectPlan}}}

Generated Code Snippet (first 1000 chars):
```
{{{generatedCode}}}
```

Project Insights (JSON):
{{{projectInsights}}}

Based on all the above, provide:
1.  keyConsideration: A critical factor or key aspect for the project's success.
2.  nextStepSuggestion: A logical next step to advance the project.
3.  potentialChallenge: A significant potential challenge or risk.
4.  longTermThought: A forward-looking thought on the project's long-term potential or evolution.

Output ONLY the JSON object adhering to the schema."#;

const THEME_TEMPLATE: &str = "You are a UI/UX color expert. Based on the project idea, suggest a harmonious and accessible color palette.
Provide HSL string values for a light theme: background, foreground, primary, and accent colors.

Project Idea: {{{projectIdea}}}

Output only the HSL values in the specified JSON structure.
Example HSL string format: '120 60% 70%'
Ensure good contrast between background and foreground.
The primary color should be distinct and usable for main interactive elements.
The accent color should be suitable for highlighting or secondary actions.";

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> PromptFields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_plan_substitutes_idea() {
        let prompt = build(TemplateId::Plan, &fields(&[("projectIdea", "A to-do app")])).unwrap();
        assert!(prompt.ends_with("Project Idea: A to-do app"));
        assert!(!prompt.contains("{{{"));
    }

    #[test]
    fn test_build_is_idempotent() {
        let input = fields(&[
            ("projectIdea", "weather dashboard"),
            ("projectPlan", r#"{"milestone1":"a"}"#),
            ("generatedCode", "export default 1;"),
        ]);
        let first = build(TemplateId::Insights, &input).unwrap();
        let second = build(TemplateId::Insights, &input).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_field_is_an_error() {
        let err = build(TemplateId::CodeFromFlowchart, &fields(&[("projectIdea", "x")])).unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingField {
                template: "code",
                field: "flowchart".to_string()
            }
        );
    }

    #[test]
    fn test_no_escaping_and_no_rescan() {
        let prompt = render(
            "inline",
            "A={{{a}}} B={{{b}}}",
            &fields(&[("a", "{{{b}}} <b>&</b>"), ("b", "two")]),
            &["a", "b"],
            100,
        )
        .unwrap();
        assert_eq!(prompt, "A={{{b}}} <b>&</b> B=two");
    }

    #[test]
    fn test_placeholder_whitespace_tolerated() {
        let prompt = render("inline", "[{{{ a }}}]", &fields(&[("a", "x")]), &[], 10).unwrap();
        assert_eq!(prompt, "[x]");
    }

    #[test]
    fn test_truncation_boundary() {
        let at_limit = "a".repeat(500);
        assert_eq!(truncate_field(&at_limit, 500), at_limit.as_str());

        let over = "a".repeat(501);
        let cut = truncate_field(&over, 500);
        assert_eq!(cut, format!("{}{}", "a".repeat(500), TRUNCATION_MARKER));
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        let value = "é".repeat(3);
        assert_eq!(truncate_field(&value, 3), "ééé");
        assert_eq!(truncate_field(&value, 2), "éé\n...");
    }

    #[test]
    fn test_insights_limit_applies_to_code() {
        let code = "x".repeat(501);
        let prompt = build(
            TemplateId::Insights,
            &fields(&[
                ("projectIdea", "idea"),
                ("projectPlan", "{}"),
                ("generatedCode", &code),
            ]),
        )
        .unwrap();
        assert!(prompt.contains(&format!("{}\n...\n```", "x".repeat(500))));
        assert!(!prompt.contains(&"x".repeat(501)));
    }

    #[test]
    fn test_insights_leaves_plan_and_idea_whole() {
        let idea = "i".repeat(600);
        let plan = "p".repeat(600);
        let code = "c".repeat(600);
        let prompt = build(
            TemplateId::Insights,
            &fields(&[
                ("projectIdea", &idea),
                ("projectPlan", &plan),
                ("generatedCode", &code),
            ]),
        )
        .unwrap();
        assert!(prompt.contains(&idea));
        assert!(prompt.contains(&plan));
        assert!(!prompt.contains(&code));
        assert!(prompt.contains(&format!("{}{}", "c".repeat(500), TRUNCATION_MARKER)));
    }

    #[test]
    fn test_review_limits_only_code() {
        let insights = "n".repeat(1500);
        let code = "c".repeat(1500);
        let prompt = build(
            TemplateId::Review,
            &fields(&[
                ("projectIdea", "idea"),
                ("projectPlan", "{}"),
                ("generatedCode", &code),
                ("projectInsights", &insights),
            ]),
        )
        .unwrap();
        assert!(prompt.contains(&insights));
        assert!(!prompt.contains(&code));
    }

    #[test]
    fn test_selected_fields_only_are_truncated() {
        let prompt = render(
            "inline",
            "{{{a}}}|{{{b}}}",
            &fields(&[("a", "abcdef"), ("b", "abcdef")]),
            &["b"],
            3,
        )
        .unwrap();
        assert_eq!(prompt, format!("abcdef|abc{TRUNCATION_MARKER}"));
    }

    #[test]
    fn test_every_template_declares_its_placeholders() {
        for id in TemplateId::ALL {
            let supplied: PromptFields = id
                .fields()
                .iter()
                .map(|f| (f.to_string(), String::new()))
                .collect();
            let prompt = build(id, &supplied).unwrap_or_else(|e| panic!("{id}: {e}"));
            assert!(!prompt.contains("{{{"), "{id} left a placeholder");
        }
    }

    #[test]
    fn test_template_names_round_trip_through_from_str() {
        for id in TemplateId::ALL {
            assert_eq!(id.name().parse::<TemplateId>().unwrap(), id);
        }
        assert!(matches!(
            "nope".parse::<TemplateId>(),
            Err(TemplateError::UnknownTemplate { .. })
        ));
    }

    #[test]
    fn test_limits_per_template() {
        assert_eq!(TemplateId::Insights.max_field_chars(), 500);
        assert_eq!(TemplateId::Image.max_field_chars(), 1000);
        assert_eq!(TemplateId::Review.max_field_chars(), 1000);
        assert_eq!(TemplateId::Plan.max_field_chars(), 2000);
    }
}
