use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

const INDENT: &str = "  ";

/// Render a coach answer for a plain terminal.
///
/// Emphasis markers are dropped, headings are underlined, list items get
/// bullets or numbers, code blocks and quotes are indented.
pub fn render_terminal(input: &str) -> String {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES;
    let mut ctx = RenderContext::default();
    for event in Parser::new_ext(input, options) {
        ctx.handle_event(event);
    }
    ctx.finish()
}

#[derive(Default)]
struct RenderContext {
    out: String,
    line: String,
    heading: Option<HeadingLevel>,
    in_code_block: bool,
    quote_depth: usize,
    // `None` for bullets, `Some(n)` for the next number
    lists: Vec<Option<u64>>,
    link_url: Option<String>,
}

impl RenderContext {
    fn prefix(&self) -> String {
        let mut prefix = "> ".repeat(self.quote_depth);
        if self.lists.len() > 1 {
            prefix.push_str(&INDENT.repeat(self.lists.len() - 1));
        }
        prefix
    }

    fn flush_line(&mut self) {
        if self.line.trim().is_empty() {
            self.line.clear();
            return;
        }
        let line = std::mem::take(&mut self.line);
        let prefix = self.prefix();
        self.out.push_str(&prefix);
        self.out.push_str(line.trim_end());
        self.out.push('\n');
    }

    fn blank_line(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with("\n\n") && self.lists.is_empty() {
            self.out.push('\n');
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.handle_start(tag),
            Event::End(tag) => self.handle_end(tag),
            Event::Text(text) => {
                if self.in_code_block {
                    let prefix = self.prefix();
                    for line in text.lines() {
                        self.out.push_str(&prefix);
                        self.out.push_str(INDENT);
                        self.out.push_str(line);
                        self.out.push('\n');
                    }
                } else {
                    self.line.push_str(&text);
                }
            }
            Event::Code(code) => self.line.push_str(&code),
            Event::SoftBreak => self.line.push(' '),
            Event::HardBreak => self.flush_line(),
            Event::Rule => {
                self.flush_line();
                self.blank_line();
                self.out.push_str("----------\n");
            }
            _ => {}
        }
    }

    fn handle_start(&mut self, tag: Tag) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_line();
                self.blank_line();
                self.heading = Some(level);
            }
            Tag::CodeBlock(kind) => {
                self.flush_line();
                self.blank_line();
                self.in_code_block = true;
                if let CodeBlockKind::Fenced(lang) = kind {
                    let lang = lang.trim();
                    if !lang.is_empty() {
                        let prefix = self.prefix();
                        self.out.push_str(&format!("{}[{}]\n", prefix, lang));
                    }
                }
            }
            Tag::BlockQuote(_) => {
                self.flush_line();
                self.quote_depth += 1;
            }
            Tag::List(start) => {
                self.flush_line();
                if self.lists.is_empty() {
                    self.blank_line();
                }
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush_line();
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}. ", n);
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.line.push_str(&marker);
            }
            Tag::Link { dest_url, .. } => {
                self.link_url = Some(dest_url.to_string());
            }
            _ => {}
        }
    }

    fn handle_end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush_line();
                self.blank_line();
            }
            TagEnd::Heading(_) => {
                let level = self.heading.take();
                let width = self.line.trim().chars().count();
                self.flush_line();
                let rule = if level == Some(HeadingLevel::H1) { '=' } else { '-' };
                let prefix = self.prefix();
                self.out.push_str(&prefix);
                self.out.extend(std::iter::repeat(rule).take(width));
                self.out.push('\n');
                self.blank_line();
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.blank_line();
            }
            TagEnd::BlockQuote(_) => {
                self.flush_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::List(_) => {
                self.flush_line();
                self.lists.pop();
                self.blank_line();
            }
            TagEnd::Item => self.flush_line(),
            TagEnd::Link => {
                if let Some(url) = self.link_url.take() {
                    if !self.line.ends_with(&url) {
                        self.line.push_str(&format!(" ({})", url));
                    }
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> String {
        self.flush_line();
        self.out.trim_end().to_string()
    }
}
