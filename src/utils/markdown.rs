use pulldown_cmark::{html, Event, Options, Parser, Tag};
use std::collections::HashSet;
use super::text_utils;

// Rendering of the article bodies. Gives back the HTML
// body and the HTML table of contents, in that order.
// Every heading gets an id attribute so that the TOC
// links have something to point at.

struct Heading {
  level: usize,
  id: String,
  text: String
}

// Tree node for the nested TOC lists.
struct TocEntry {
  level: usize,
  id: String,
  text: String,
  children: Vec<TocEntry>
}

fn parser_options() -> Options {
  let mut options = Options::empty();
  options.insert(Options::ENABLE_TABLES);
  options.insert(Options::ENABLE_FOOTNOTES);
  options.insert(Options::ENABLE_STRIKETHROUGH);
  options
}

pub fn render(body: &str) -> (String, String) {
  let headings = collect_headings(body);

  let mut heading_index = 0;
  let events = Parser::new_ext(body, parser_options())
    .map(|event| match event {
      Event::Start(Tag::Heading(level, _, classes)) => {
        let id = headings.get(heading_index).map(|h| h.id.as_str());
        heading_index += 1;
        Event::Start(Tag::Heading(level, id, classes))
      },
      other => other
    });

  let mut body_html = String::with_capacity(body.len() * 3 / 2);
  html::push_html(&mut body_html, events);

  (body_html, toc_html(headings))
}

// First pass over the document, only looking at headings.
fn collect_headings(body: &str) -> Vec<Heading> {
  let mut headings: Vec<Heading> = Vec::new();
  let mut used_ids: HashSet<String> = HashSet::new();
  let mut current: Option<(usize, String)> = None;

  for event in Parser::new_ext(body, parser_options()) {
    match event {
      Event::Start(Tag::Heading(level, _, _)) => {
        current = Some((level as usize, String::new()));
      },
      Event::Text(text) | Event::Code(text) => {
        if let Some((_, heading_text)) = current.as_mut() {
          heading_text.push_str(&text);
        }
      },
      Event::End(Tag::Heading(_, _, _)) => {
        if let Some((level, text)) = current.take() {
          let id = unique_id(text_utils::slugify(&text), &mut used_ids);
          headings.push(Heading { level, id, text });
        }
      },
      _ => ()
    }
  }
  headings
}

fn unique_id(slug: String, used_ids: &mut HashSet<String>) -> String {
  let base = if slug.is_empty() { String::from("_") } else { slug };
  let mut id = base.clone();
  let mut counter = 1;
  while used_ids.contains(&id) {
    id = format!("{}_{}", base, counter);
    counter += 1;
  }
  used_ids.insert(id.clone());
  id
}

// Headings become a tree: a heading is nested under the
// closest previous heading with a lower level.
fn toc_tree(headings: Vec<Heading>) -> Vec<TocEntry> {
  let mut roots: Vec<TocEntry> = Vec::new();
  let mut stack: Vec<TocEntry> = Vec::new();

  for heading in headings {
    let entry = TocEntry {
      level: heading.level,
      id: heading.id,
      text: heading.text,
      children: Vec::new()
    };
    while let Some(top) = stack.pop() {
      if top.level < entry.level {
        stack.push(top);
        break;
      }
      attach(top, &mut stack, &mut roots);
    }
    stack.push(entry);
  }
  while let Some(top) = stack.pop() {
    attach(top, &mut stack, &mut roots);
  }
  roots
}

fn attach(entry: TocEntry, stack: &mut Vec<TocEntry>, roots: &mut Vec<TocEntry>) {
  match stack.last_mut() {
    Some(parent) => parent.children.push(entry),
    None => roots.push(entry)
  }
}

fn toc_html(headings: Vec<Heading>) -> String {
  let mut toc = String::from("<div class=\"toc\">\n");
  write_toc_list(&toc_tree(headings), &mut toc);
  toc.push_str("</div>\n");
  toc
}

fn write_toc_list(entries: &[TocEntry], out: &mut String) {
  if entries.is_empty() {
    out.push_str("<ul></ul>\n");
    return;
  }
  out.push_str("<ul>\n");
  for entry in entries {
    out.push_str(&format!(
      "<li><a href=\"#{}\">{}</a>",
      text_utils::escape_html(&entry.id),
      text_utils::escape_html(&entry.text)
    ));
    if !entry.children.is_empty() {
      out.push('\n');
      write_toc_list(&entry.children, out);
    }
    out.push_str("</li>\n");
  }
  out.push_str("</ul>\n");
}
