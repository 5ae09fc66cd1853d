//! The runtime: template cache, tick scheduler and directive set.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use sinopia_armature::ParserOptions;
use sinopia_carton::hash::hash_parts;
use sinopia_carton::FxHashMap;
use sinopia_relief::Node;
use sinopia_tempera::{Object, Scheduler};

use crate::compiler::compile;
use crate::directive::DirectiveSet;
use crate::instantiate::instantiate;
use crate::template::Template;
use crate::view::View;

/// Owns everything instances share.
///
/// Handlers keep an `Rc<Runtime>` so loops can compile and render their row
/// template through the same cache and scheduler.
pub struct Runtime {
    scheduler: Scheduler,
    directives: DirectiveSet,
    parser: ParserOptions,
    directive_signature: String,
    templates: RefCell<FxHashMap<u64, Rc<Template>>>,
}

impl Runtime {
    pub fn new(directives: DirectiveSet) -> Rc<Self> {
        Self::with_options(directives, ParserOptions::default())
    }

    pub fn with_options(directives: DirectiveSet, parser: ParserOptions) -> Rc<Self> {
        Rc::new(Self {
            scheduler: Scheduler::new(),
            directive_signature: directives.signature(),
            directives,
            parser,
            templates: RefCell::new(FxHashMap::default()),
        })
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn directives(&self) -> &DirectiveSet {
        &self.directives
    }

    pub fn parser_options(&self) -> ParserOptions {
        self.parser
    }

    /// The compiled template for `markup`, compiling it on first use.
    pub fn template(&self, markup: &str) -> Rc<Template> {
        let key = hash_parts([markup, self.directive_signature.as_str()]);
        if let Some(template) = self.templates.borrow().get(&key) {
            return template.clone();
        }

        let template = Rc::new(Template::parse(markup, self.parser, &self.directives));
        tracing::debug!(id = template.id(), bindings = template.bindings().len(), "template cached");
        self.templates.borrow_mut().insert(key, template.clone());
        template
    }

    pub fn cached_templates(&self) -> usize {
        self.templates.borrow().len()
    }

    /// Instantiate `template` and feed it `data`.
    ///
    /// The returned view holds the instance in a fragment. Rendering happens
    /// on the following ticks.
    pub fn render(self: &Rc<Self>, template: &Template, data: &Object) -> View {
        let content = template.instantiate_content();
        let handlers = instantiate(&content, template.bindings(), self);
        for handler in &handlers {
            handler.render(data);
        }
        View::new(content, handlers, data.clone())
    }

    pub fn render_markup(self: &Rc<Self>, markup: &str, data: &Object) -> View {
        let template = self.template(markup);
        self.render(&template, data)
    }

    /// Compile `root` and bind it in place.
    pub fn bind(self: &Rc<Self>, root: &Node, data: &Object) -> View {
        let bindings = compile(root, &self.directives);
        let handlers = instantiate(root, &bindings, self);
        for handler in &handlers {
            handler.render(data);
        }
        View::new(root.clone(), handlers, data.clone())
    }

    /// Run one tick.
    pub fn flush(&self) -> usize {
        self.scheduler.flush()
    }

    /// Run ticks until nothing is queued, at most `max_ticks`.
    pub fn run_until_idle(&self, max_ticks: usize) -> usize {
        self.scheduler.run_until_idle(max_ticks)
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("directives", &self.directives)
            .field("templates", &self.cached_templates())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sinopia_tempera::Value;

    #[test]
    fn test_template_cache_is_keyed_by_markup() {
        let runtime = Runtime::new(DirectiveSet::standard());
        let a = runtime.template("<p>{{ x }}</p>");
        let b = runtime.template("<p>{{ x }}</p>");
        let c = runtime.template("<p>{{ y }}</p>");
        assert!(Rc::ptr_eq(&a, &b));
        assert!(!Rc::ptr_eq(&a, &c));
        assert_eq!(runtime.cached_templates(), 2);
    }

    #[test]
    fn test_render_is_deferred_to_the_tick() {
        let runtime = Runtime::new(DirectiveSet::standard());
        let data = Object::from_entries([("name", Value::from("Ada"))]);
        let view = runtime.render_markup("<p>Hi {{ name }}</p>", &data);
        assert_eq!(view.html(), "<p>Hi <!----></p>");

        runtime.flush();
        assert_eq!(view.html(), "<p>Hi Ada<!----></p>");
    }

    #[test]
    fn test_bind_in_place() {
        let runtime = Runtime::new(DirectiveSet::standard());
        let root = Node::element("a");
        root.set_attribute("b:attr.href", "url");
        let data = Object::from_entries([("url", Value::from("/home"))]);

        let view = runtime.bind(&root, &data);
        runtime.flush();
        assert_eq!(view.html(), r#"<a href="/home"></a>"#);
    }
}
