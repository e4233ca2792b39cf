//! CSS synthesized from wizard knobs.
//!
//! Each knob owns one template fragment. A set knob appends its fragment
//! with the value substituted for `{value}`; fragments are independent, so
//! the output only depends on which knobs are set.

use drape_types::WizardSettings;

const MARGIN: &str = "
#workskin {
  margin: auto {value}%;
  padding: 0.5em {value}% 0;
}
";

const BASE_EM: &str = "
body {
  font-size: {value}%;
}
";

const FONT: &str = "
body,
.toggled form,
.dynamic form,
.secondary,
.dropdown,
blockquote,
pre,
input,
textarea,
.heading .actions,
.heading .action,
.heading span.actions,
span.unread,
.replied,
span.claimed,
.actions span.defaulted {
  font-family: {value};
}
";

const BACKGROUND_COLOR: &str = "
body,
.toggled form,
.dynamic form,
.secondary,
.dropdown,
th,
tr:hover,
col.name,
div.dynamic,
fieldset fieldset,
fieldset dl dl,
form blockquote.userstuff,
form.verbose legend,
.verbose form legend,
#modal,
.own,
.draft,
.draft .wrapper,
.unread,
.child,
.unwrangled,
.unreviewed,
.thread .even,
.listbox .index,
#outer {
  background: {value};
}

a.tag:hover,
.listbox .heading a.tag:visited:hover {
  color: {value};
}

tbody tr,
thead td,
#footer,
#modal {
  border-color: {value};
}

.listbox,
fieldset fieldset.listbox {
  box-shadow: 0 0 0 1px {value};
}

.listbox .index {
  box-shadow: inset 1px 1px 3px rgba(0, 0, 0, 0.5);
}
";

const PARAGRAPH_MARGIN: &str = "
.userstuff p {
  margin-bottom: {value}em;
}
";

const FOREGROUND_COLOR: &str = "
body,
.toggled form,
.dynamic form,
.secondary,
.dropdown,
#header .search,
form dd.required,
.post .required .warnings,
dd.required,
.required .autocomplete,
.userstuff h2 {
  color: {value};
}

a,
a:link,
a:visited,
a:hover,
#header a,
#header a:visited,
#header .current,
#header .primary .open a,
#header .primary .dropdown:hover a,
#header .primary .dropdown a:focus,
#header .menu .current,
#header .primary .menu a,
#header .primary .menu .current,
#dashboard a,
a.tag,
.listbox > .heading,
.listbox .heading a:visited,
.filters dt a:hover {
  color: {value};
}

form dt,
form.verbose legend,
.verbose form legend,
.faq .categories h3,
.splash .module h3,
.userstuff h3 {
  border-color: {value};
}

.notice:not(.required),
.comment_notice,
ul.notes,
.caution,
.notice a {
  color: #2a2a2a;
}
";

const HEADER_COLOR: &str = "
#header .primary,
#footer,
.autocomplete .dropdown ul li:hover,
li.selected,
a.tag:hover,
.listbox .heading a.tag:visited:hover,
.splash .favorite li:nth-of-type(odd) a:hover,
.splash .favorite li:nth-of-type(odd) a:focus {
  background-image: none;
  background-color: {value};
}

#header .heading a,
#header .user a:hover,
#header .user a:focus,
#header .user .current,
#dashboard a:hover,
.actions a:hover,
.actions input:hover,
.actions a:focus,
.actions input:focus,
label.action:hover,
.action:hover,
.action:focus,
a.cloud1,
a.cloud2,
a.cloud3,
a.cloud4,
a.cloud5,
a.cloud6,
a.cloud7,
a.cloud8,
a.work,
.blurb h4 a:link,
.splash .module h3,
.splash .browse li a:before {
  color: {value};
}

#dashboard,
#dashboard.own {
  border-color: {value};
}
";

const ACCENT_COLOR: &str = "
table,
thead td,
#header .actions a:hover,
#header .actions a:focus,
#header .dropdown:hover a,
#header .open a,
#header .menu,
#small_login,
#header .dropdown:hover .current + .menu,
fieldset,
form dl,
fieldset dl dl,
fieldset fieldset fieldset,
fieldset fieldset dl dl,
dd.hideme,
form blockquote.userstuff,
dl.index dd,
.statistics .index li:nth-of-type(even),
.listbox,
fieldset fieldset.listbox,
.item dl.visibility,
.reading h4.viewed,
.comment h4.byline,
.splash .favorite li:nth-of-type(odd) a,
.splash .module div.account,
.search [role=\"tooltip\"] {
  background: {value};
  border-color: {value};
}

li.relationships a {
  background: {value};
}

li.blurb,
fieldset,
form dl,
thead,
tfoot,
tfoot td,
th,
tr:hover,
col.name,
#dashboard ul,
.toggled form,
.dynamic form,
.secondary,
dl.meta,
.bookmark .user,
div.comment,
li.comment,
.comment div.icon,
.splash .news li,
.userstuff blockquote {
  border-color: {value};
}

fieldset,
form dl,
fieldset dl dl,
fieldset fieldset fieldset,
fieldset fieldset dl dl,
form blockquote.userstuff {
  box-shadow: inset 1px 0 5px rgba(0, 0, 0, 0.5);
}

fieldset dl,
fieldset.actions,
fieldset dl fieldset dl,
form.verbose legend,
.verbose form legend {
  box-shadow: none;
}

@media only screen and (max-width: 62em) {
  #dashboard .secondary {
    background: {value};
    box-shadow: none;
  }
}

@media only screen and (max-width: 42em) {
  .javascript {
    background: {value};
  }
}
";

fn text_knob(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Synthesize CSS for every set knob. Empty when none is set.
pub fn wizard_css(settings: &WizardSettings) -> String {
    let knobs = [
        (settings.margin.map(|v| v.to_string()), MARGIN),
        (settings.base_em.map(|v| v.to_string()), BASE_EM),
        (text_knob(&settings.font), FONT),
        (text_knob(&settings.background_color), BACKGROUND_COLOR),
        (settings.paragraph_margin.map(|v| v.to_string()), PARAGRAPH_MARGIN),
        (text_knob(&settings.foreground_color), FOREGROUND_COLOR),
        (text_knob(&settings.header_color), HEADER_COLOR),
        (text_knob(&settings.accent_color), ACCENT_COLOR),
    ];
    let mut css = String::new();
    for (value, template) in knobs {
        if let Some(v) = value {
            css.push_str(&template.replace("{value}", &v));
        }
    }
    css
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_knobs_no_css() {
        assert!(wizard_css(&WizardSettings::default()).is_empty());
    }

    #[test]
    fn margin_fragment() {
        let css = wizard_css(&WizardSettings {
            margin: Some(5.0),
            ..WizardSettings::default()
        });
        assert!(css.contains("margin: auto 5%;"));
        assert!(css.contains("padding: 0.5em 5% 0;"));
        assert!(!css.contains("{value}"));
    }

    #[test]
    fn colors_substituted_everywhere() {
        let css = wizard_css(&WizardSettings {
            accent_color: Some("#ddeeff".into()),
            ..WizardSettings::default()
        });
        assert!(!css.contains("{value}"));
        assert!(css.matches("#ddeeff").count() >= 5);
    }

    #[test]
    fn blank_text_knob_skipped() {
        let css = wizard_css(&WizardSettings {
            font: Some("  ".into()),
            ..WizardSettings::default()
        });
        assert!(css.is_empty());
    }

    #[test]
    fn knobs_are_additive() {
        let font_only = wizard_css(&WizardSettings {
            font: Some("Georgia, serif".into()),
            ..WizardSettings::default()
        });
        let para_only = wizard_css(&WizardSettings {
            paragraph_margin: Some(1.5),
            ..WizardSettings::default()
        });
        let both = wizard_css(&WizardSettings {
            font: Some("Georgia, serif".into()),
            paragraph_margin: Some(1.5),
            ..WizardSettings::default()
        });
        assert_eq!(both, format!("{font_only}{para_only}"));
        assert!(both.contains("font-family: Georgia, serif;"));
        assert!(both.contains("margin-bottom: 1.5em;"));
    }
}
