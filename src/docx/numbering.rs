use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use super::styles::Styles;
use crate::error::Error;
use crate::model::{LevelStart, NumberingLevel, ParagraphIndent, ParagraphNumbering};
use crate::xml::XmlElement;

#[derive(Clone, Debug, Default)]
pub struct AbstractNum {
    pub levels: BTreeMap<u8, NumberingLevel>,
    /// Set when the definition defers its levels to a numbering style.
    pub num_style_link: Option<String>,
}

#[derive(Clone, Default)]
pub struct NumberingOptions {
    pub styles: Option<Arc<Styles>>,
}

/// Read-only numbering index: `numId → abstractNumId → level`.
#[derive(Clone, Debug, Default)]
pub struct Numbering {
    nums: HashMap<String, String>,
    abstract_nums: HashMap<String, AbstractNum>,
    levels_by_paragraph_style_id: HashMap<String, NumberingLevel>,
    styles: Arc<Styles>,
}

impl Numbering {
    /// `abstract_nums` is taken in document order; when two levels claim the
    /// same paragraph style, the later one wins.
    pub fn new(
        nums: HashMap<String, String>,
        abstract_nums: Vec<(String, AbstractNum)>,
        styles: Arc<Styles>,
    ) -> Self {
        let mut levels_by_paragraph_style_id = HashMap::new();
        for (_, abstract_num) in &abstract_nums {
            for level in abstract_num.levels.values() {
                if let Some(style_id) = &level.paragraph_style_id {
                    levels_by_paragraph_style_id.insert(style_id.clone(), level.clone());
                }
            }
        }
        Self {
            nums,
            abstract_nums: abstract_nums.into_iter().collect(),
            levels_by_paragraph_style_id,
            styles,
        }
    }

    /// `numId → abstractNumId` for every `w:num`.
    pub fn nums(&self) -> &HashMap<String, String> {
        &self.nums
    }

    pub fn abstract_nums(&self) -> &HashMap<String, AbstractNum> {
        &self.abstract_nums
    }

    pub fn styles(&self) -> &Styles {
        &self.styles
    }

    pub fn find_level(&self, num_id: &str, level: u8) -> Option<&NumberingLevel> {
        let mut visited = HashSet::new();
        self.find_level_guarded(num_id, level, &mut visited)
    }

    fn find_level_guarded(
        &self,
        num_id: &str,
        level: u8,
        visited: &mut HashSet<String>,
    ) -> Option<&NumberingLevel> {
        if !visited.insert(num_id.to_string()) {
            log::debug!("Numbering style link cycle through numId {num_id}");
            return None;
        }
        let abstract_num_id = self.nums.get(num_id)?;
        let abstract_num = self.abstract_nums.get(abstract_num_id)?;
        match &abstract_num.num_style_link {
            None => abstract_num.levels.get(&level),
            Some(link) => {
                let style = self.styles.find_numbering_style_by_id(link)?;
                let linked = style.num_id.as_deref()?;
                self.find_level_guarded(linked, level, visited)
            }
        }
    }

    pub fn find_level_by_paragraph_style_id(&self, style_id: &str) -> Option<&NumberingLevel> {
        self.levels_by_paragraph_style_id.get(style_id)
    }

    /// Numbering for a paragraph: an explicit `w:numPr` reference first,
    /// then a level bound to the paragraph style.
    pub fn read_paragraph_numbering(
        &self,
        style_id: Option<&str>,
        num_pr: &XmlElement,
    ) -> Option<ParagraphNumbering> {
        let level = num_pr.first("w:ilvl").and_then(|n| n.attribute("w:val"));
        let num_id = num_pr.first("w:numId").and_then(|n| n.attribute("w:val"));

        if num_id.is_none()
            && let Some(style_id) = style_id
            && let Some(level) = self.find_level_by_paragraph_style_id(style_id)
        {
            return Some(ParagraphNumbering {
                num_id: None,
                level: level.clone(),
            });
        }

        let num_id = num_id?;
        let level = level?.parse::<u8>().ok()?;
        self.find_level(num_id, level).map(|level| ParagraphNumbering {
            num_id: Some(num_id.to_string()),
            level: level.clone(),
        })
    }
}

pub fn read_numbering_xml(root: &XmlElement, options: &NumberingOptions) -> Result<Numbering, Error> {
    let styles = options.styles.clone().ok_or(Error::MissingStyles)?;

    let abstract_nums: Vec<(String, AbstractNum)> = root
        .elements_by_tag_name("w:abstractNum")
        .into_iter()
        .filter_map(|element| {
            let id = element.attribute("w:abstractNumId")?;
            Some((id.to_string(), read_abstract_num(element)))
        })
        .collect();

    let nums: HashMap<String, String> = root
        .elements_by_tag_name("w:num")
        .into_iter()
        .filter_map(|element| {
            let num_id = element.attribute("w:numId")?;
            let abstract_num_id = element.first("w:abstractNumId")?.attribute("w:val")?;
            Some((num_id.to_string(), abstract_num_id.to_string()))
        })
        .collect();

    log::debug!(
        "Read numbering: {} abstract definitions, {} instances",
        abstract_nums.len(),
        nums.len()
    );
    Ok(Numbering::new(nums, abstract_nums, styles))
}

fn read_abstract_num(element: &XmlElement) -> AbstractNum {
    let mut levels = BTreeMap::new();
    let mut start_by_level: BTreeMap<u8, LevelStart> = BTreeMap::new();

    for level_element in element.elements_by_tag_name("w:lvl") {
        let Some(level) = level_element
            .attribute("w:ilvl")
            .and_then(|v| v.parse::<u8>().ok())
        else {
            continue;
        };
        let number_format = val(level_element, "w:numFmt");
        let start = val(level_element, "w:start").and_then(|v| v.parse().ok());

        start_by_level.insert(
            level,
            LevelStart {
                start,
                number_format: number_format.clone(),
            },
        );

        let indent = level_element
            .first("w:pPr")
            .and_then(|ppr| ppr.first("w:ind"))
            .map(read_indent);

        levels.insert(
            level,
            NumberingLevel {
                level,
                is_ordered: number_format.as_deref() != Some("bullet"),
                number_format,
                level_text: val(level_element, "w:lvlText"),
                level_restart: val(level_element, "w:lvlRestart").and_then(|v| v.parse().ok()),
                is_legal: level_element.first("w:isLgl").is_some(),
                start,
                paragraph_style_id: val(level_element, "w:pStyle"),
                indent,
                start_by_level: start_by_level.clone(),
            },
        );
    }

    AbstractNum {
        levels,
        num_style_link: val(element, "w:numStyleLink"),
    }
}

fn val(element: &XmlElement, child: &str) -> Option<String> {
    element
        .first(child)
        .and_then(|n| n.attribute("w:val"))
        .map(String::from)
}

pub(super) fn read_indent(element: &XmlElement) -> ParagraphIndent {
    let twips = |names: &[&str]| {
        names
            .iter()
            .find_map(|name| element.attribute(name).filter(|v| !v.is_empty()))
            .and_then(|v| v.parse::<i32>().ok())
    };
    ParagraphIndent {
        start: twips(&["w:start", "w:left"]),
        end: twips(&["w:end", "w:right"]),
        first_line: twips(&["w:firstLine"]),
        hanging: twips(&["w:hanging"]),
    }
}
