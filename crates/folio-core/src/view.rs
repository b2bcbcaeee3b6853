#![forbid(unsafe_code)]

//! Markup for cards, detail panels and overlays.
//!
//! Everything here is a pure function of a [`Project`]. Free-text fields are
//! emitted as text nodes, never as raw HTML.

use crate::labels::{difficulty_stars, solution_words, year_label};
use crate::markup::Element;
use crate::project::Project;

/// Attribute carrying a card's identity key.
pub const KEY_ATTRIBUTE: &str = "data-key";

/// Attribute carrying a solution item's position in its list.
pub const INDEX_ATTRIBUTE: &str = "data-index";

/// Label of the button that closes the detail panel.
pub const CLOSE_LABEL: &str = "Вернуться к списку проектов";

/// Collapsed card for `project`.
#[must_use]
pub fn card_markup(project: &Project) -> Element {
    let words = solution_words(u64::from(project.resolved_issues));
    let logo = project
        .logo
        .as_ref()
        .and_then(|logo| logo.primary())
        .unwrap_or_default();

    Element::new("div")
        .class("project animate")
        .attr(KEY_ATTRIBUTE, project.name.as_str())
        .attr("aria-expanded", "false")
        .child(
            Element::new("div").class("project-image").child(
                Element::new("img")
                    .attr("src", logo)
                    .attr("alt", project.name.as_str()),
            ),
        )
        .child(
            Element::new("div")
                .class("content")
                .child(
                    Element::new("div")
                        .class("resolved-issue-digit")
                        .text(project.resolved_issues.to_string()),
                )
                .child(
                    Element::new("div")
                        .class("resolved-issue")
                        .text(words.qualifier)
                        .child(Element::new("br"))
                        .text(words.noun),
                )
                .child(
                    Element::new("div")
                        .class("type-description")
                        .text(project.type_name.as_deref().unwrap_or_default()),
                )
                .child(Element::new("h3").text(project.name.as_str()))
                .child(
                    Element::new("div")
                        .class("content-bottom")
                        .child(
                            Element::new("div")
                                .class("difficulty")
                                .text(difficulty_stars(project.difficulty))
                                .child(Element::new("br"))
                                .child(
                                    Element::new("span")
                                        .class("difficulty2")
                                        .text("класс сложности"),
                                ),
                        )
                        .child(Element::new("div").class("year").text(year_label(project.year))),
                ),
        )
        .child(Element::new("div").class("gradient gradient-bottom"))
        .child(Element::new("div").class("gradient gradient-left"))
}

/// Detail panel appended into an expanded card.
///
/// Blocks whose source field is empty are omitted.
#[must_use]
pub fn detail_markup(project: &Project) -> Element {
    let description = project.description.as_deref().filter(|s| !s.is_empty());
    let status = project.status.as_deref().filter(|s| !s.is_empty());
    let details = project.details.as_deref().filter(|s| !s.is_empty());

    let mut panel = Element::new("div").class("project-details").child(
        Element::new("button")
            .class("close-details")
            .attr("type", "button")
            .text(CLOSE_LABEL),
    );

    if let Some(text) = description {
        panel = panel
            .child(Element::new("h4").text("О проекте"))
            .child(Element::new("div").class("description").text(text));
    }
    if let Some(text) = status {
        panel = panel.child(
            Element::new("p")
                .class("status")
                .child(Element::new("strong").text("Статус:"))
                .text(format!(" {text}")),
        );
    }
    if let Some(text) = details {
        panel = panel.child(
            Element::new("p")
                .class("details")
                .child(Element::new("strong").text("Подробности:"))
                .text(format!(" {text}")),
        );
    }

    panel
        .child_opt(solutions_block(project))
        .child_opt(info_block(project))
        .child_opt(slider_block(project))
}

fn solutions_block(project: &Project) -> Option<Element> {
    if project.solutions.is_empty() {
        return None;
    }
    let items = project.solutions.iter().enumerate().map(|(i, solution)| {
        Element::new("div")
            .class("solution-item")
            .attr(INDEX_ATTRIBUTE, i.to_string())
            .child(
                Element::new("div")
                    .class("solution-title")
                    .child(Element::new("span").class("title-text").text(solution.title.as_str()))
                    .child(Element::new("span").class("toggle-icon")),
            )
            .child(
                Element::new("div")
                    .class("solution-desc")
                    .text(solution.description.as_str()),
            )
    });
    Some(
        Element::new("div")
            .class("solutions-block")
            .child(Element::new("h4").text("Уникальные решения"))
            .children(items),
    )
}

fn info_block(project: &Project) -> Option<Element> {
    if project.information.is_empty() {
        return None;
    }
    let items = project
        .information
        .iter()
        .map(|line| Element::new("li").text(line.as_str()));
    Some(
        Element::new("div")
            .class("info-block")
            .child(Element::new("h4").text("Краткая информация"))
            .child(Element::new("ul").children(items)),
    )
}

fn slider_block(project: &Project) -> Option<Element> {
    let first = project.screenshots.first()?;
    Some(
        Element::new("div")
            .class("screenshots-slider active")
            .child(
                Element::new("button")
                    .class("prev")
                    .attr("type", "button")
                    .attr("aria-label", "Предыдущий")
                    .text("‹"),
            )
            .child(
                Element::new("img")
                    .class("current")
                    .attr("src", first.as_str())
                    .attr("alt", "screenshot"),
            )
            .child(
                Element::new("button")
                    .class("next")
                    .attr("type", "button")
                    .attr("aria-label", "Следующий")
                    .text("›"),
            ),
    )
}

/// Full-screen screenshot overlay.
#[must_use]
pub fn lightbox_markup(src: &str) -> Element {
    Element::new("div")
        .class("lightbox")
        .child(Element::new("img").attr("src", src).attr("alt", "full"))
}

/// Floating "back" control shown while a card is expanded.
#[must_use]
pub fn back_control_markup() -> Element {
    Element::new("button")
        .class("back-floating")
        .attr("type", "button")
        .attr("aria-label", CLOSE_LABEL)
        .text("←")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{Logo, Solution};
    use pretty_assertions::assert_eq;

    fn shop() -> Project {
        Project {
            logo: Some(Logo::Gallery(vec!["shop.png".into(), "shop-2.png".into()])),
            type_name: Some("Интернет-магазин".into()),
            year: Some(2023),
            difficulty: 4,
            resolved_issues: 22,
            description: Some("<b>not html</b>".into()),
            solutions: vec![
                Solution {
                    title: "Cart".into(),
                    description: "Local cart".into(),
                },
                Solution {
                    title: "Search".into(),
                    description: String::new(),
                },
            ],
            information: vec!["Rust".into()],
            screenshots: vec!["a.png".into(), "b.png".into()],
            ..Project::named("Shop X")
        }
    }

    #[test]
    fn card_carries_key_labels_and_logo() {
        let card = card_markup(&shop());
        assert!(card.has_class("project"));
        assert!(card.has_class("animate"));
        assert_eq!(card.attribute(KEY_ATTRIBUTE), Some("Shop X"));

        let img = card.find_class("project-image").and_then(|el| match &el.children[0] {
            crate::markup::Markup::Element(img) => Some(img),
            crate::markup::Markup::Text(_) => None,
        });
        assert_eq!(img.and_then(|img| img.attribute("src")), Some("shop.png"));

        let text = |class: &str| card.find_class(class).map(Element::text_content);
        assert_eq!(text("resolved-issue-digit").as_deref(), Some("22"));
        assert_eq!(text("resolved-issue").as_deref(), Some("уникальныхрешения"));
        assert_eq!(text("type-description").as_deref(), Some("Интернет-магазин"));
        assert_eq!(text("difficulty").as_deref(), Some("★★★★☆класс сложности"));
        assert_eq!(text("year").as_deref(), Some("2023 г."));
    }

    #[test]
    fn unrated_project_shows_one_star() {
        let project: Project = serde_json::from_str(r#"{"name": "Bare"}"#).unwrap();
        assert_eq!(project.difficulty, 0);
        let card = card_markup(&project);
        assert_eq!(
            card.find_class("difficulty").map(Element::text_content).as_deref(),
            Some("★☆☆☆☆класс сложности")
        );
    }

    #[test]
    fn detail_panel_includes_present_blocks_only() {
        let panel = detail_markup(&shop());
        assert!(panel.find_class("close-details").is_some());
        assert!(panel.find_class("solutions-block").is_some());
        assert!(panel.find_class("info-block").is_some());
        assert!(panel.find_class("screenshots-slider").is_some());
        assert!(panel.find_class("status").is_none());
        assert!(panel.find_class("details").is_none());
        // Text, not markup.
        assert_eq!(
            panel.find_class("description").map(Element::text_content).as_deref(),
            Some("<b>not html</b>")
        );

        let bare = detail_markup(&Project::named("Bare"));
        assert_eq!(bare.children.len(), 1, "only the close button");
    }

    #[test]
    fn solution_items_are_indexed() {
        let panel = detail_markup(&shop());
        let block = panel.find_class("solutions-block").unwrap();
        let indices: Vec<_> = block
            .children
            .iter()
            .filter_map(|child| match child {
                crate::markup::Markup::Element(el) => el.attribute(INDEX_ATTRIBUTE),
                crate::markup::Markup::Text(_) => None,
            })
            .collect();
        assert_eq!(indices, ["0", "1"]);
    }

    #[test]
    fn slider_starts_on_first_screenshot() {
        let panel = detail_markup(&shop());
        let current = panel.find_class("current").unwrap();
        assert_eq!(current.tag, "img");
        assert_eq!(current.attribute("src"), Some("a.png"));
    }

    #[test]
    fn overlays() {
        let lightbox = lightbox_markup("b.png");
        assert!(lightbox.has_class("lightbox"));
        assert_eq!(lightbox.children.len(), 1);
        assert!(back_control_markup().has_class("back-floating"));
    }
}
