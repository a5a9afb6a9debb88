use super::*;

/// Panel elements, creating any the host page did not provide.
pub(super) fn ensure_panel_dom() -> Result<(), String> {
    let window = web_sys::window().ok_or_else(|| "window is unavailable".to_string())?;
    let document = window
        .document()
        .ok_or_else(|| "document is unavailable".to_string())?;
    let body = document
        .body()
        .ok_or_else(|| "document body is unavailable".to_string())?;

    let root = match document.get_element_by_id(PANEL_ROOT_ID) {
        Some(existing) => existing,
        None => {
            let root = document
                .create_element("section")
                .map_err(|_| "failed to create panel root".to_string())?;
            root.set_id(PANEL_ROOT_ID);
            body.append_child(&root)
                .map_err(|_| "failed to append panel root".to_string())?;
            root
        }
    };

    for (id, tag, text) in [
        (CURRENT_MODE_ID, "div", ""),
        (DIRECT_MODE_ID, "button", "Direct"),
        (NODE_LIST_ID, "div", ""),
        (PREV_PAGE_ID, "button", "Previous"),
        (PAGE_INFO_ID, "span", ""),
        (NEXT_PAGE_ID, "button", "Next"),
        (LOGOUT_ID, "button", "Logout"),
        (INFO_BOX_ID, "div", ""),
    ] {
        if document.get_element_by_id(id).is_some() {
            continue;
        }
        let element = document
            .create_element(tag)
            .map_err(|_| format!("failed to create #{id}"))?;
        element.set_id(id);
        if !text.is_empty() {
            element.set_text_content(Some(text));
        }
        root.append_child(&element)
            .map_err(|_| format!("failed to append #{id}"))?;
    }

    let info_box = html_element(INFO_BOX_ID)?;
    info_box
        .style()
        .set_property("display", "none")
        .map_err(|_| "failed to style info box".to_string())?;
    info_box
        .style()
        .set_property("transition", "opacity 0.5s")
        .map_err(|_| "failed to style info box".to_string())?;
    Ok(())
}

pub(super) fn install_panel_handlers() {
    install_click_handler(&NODE_LIST_CLICK_HANDLER, NODE_LIST_ID, |event| {
        if let Some(raw) = clicked_node(&event) {
            dispatch_command(PanelCommand::SelectNode(raw));
        }
    });
    install_click_handler(&PREV_PAGE_CLICK_HANDLER, PREV_PAGE_ID, |_event| {
        dispatch_command(PanelCommand::PrevPage);
    });
    install_click_handler(&NEXT_PAGE_CLICK_HANDLER, NEXT_PAGE_ID, |_event| {
        dispatch_command(PanelCommand::NextPage);
    });
    install_click_handler(&DIRECT_MODE_CLICK_HANDLER, DIRECT_MODE_ID, |_event| {
        dispatch_command(PanelCommand::SelectDirect);
    });
    install_click_handler(&LOGOUT_CLICK_HANDLER, LOGOUT_ID, |_event| {
        navigate_to(LOGOUT_PATH);
    });
}

fn install_click_handler(
    slot: &'static std::thread::LocalKey<RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>>>,
    element_id: &'static str,
    handler: impl FnMut(web_sys::Event) + 'static,
) {
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        return;
    };
    let Some(element) = document.get_element_by_id(element_id) else {
        return;
    };
    slot.with(|slot| {
        if slot.borrow().is_some() {
            return;
        }
        let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(handler));
        let _ = element.add_event_listener_with_callback("click", callback.as_ref().unchecked_ref());
        *slot.borrow_mut() = Some(callback);
    });
}

/// Raw identifier of the node button under a click inside the list.
fn clicked_node(event: &web_sys::Event) -> Option<String> {
    let target = event.target()?.dyn_into::<web_sys::Element>().ok()?;
    let button = target.closest("button[data-node]").ok()??;
    if button
        .dyn_ref::<HtmlButtonElement>()
        .is_some_and(HtmlButtonElement::disabled)
    {
        return None;
    }
    button.get_attribute(NODE_DATA_ATTRIBUTE)
}

fn html_element(id: &str) -> Result<HtmlElement, String> {
    web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.get_element_by_id(id))
        .ok_or_else(|| format!("#{id} is missing"))?
        .dyn_into::<HtmlElement>()
        .map_err(|_| format!("#{id} is not HtmlElement"))
}

pub(super) fn render_panel_dom() {
    let plan = PANEL_STATE.with(|state| RenderPlan::from_view(&state.borrow().view()));
    if let Err(error) = apply_render_plan(&plan) {
        tracing::warn!(error = %error, "panel render failed");
    }
}

fn apply_render_plan(plan: &RenderPlan) -> Result<(), String> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| "document is unavailable".to_string())?;

    let current_mode = html_element(CURRENT_MODE_ID)?;
    current_mode.set_inner_html("");
    if !plan.current_mode.is_empty() {
        let label = document
            .create_element("span")
            .map_err(|_| "failed to create current mode label".to_string())?;
        label.set_class_name(crate::render_plan::ACTIVE_NODE_CLASS);
        label.set_text_content(Some(&plan.current_mode));
        let _ = current_mode.append_child(&label);
    }

    let list = html_element(NODE_LIST_ID)?;
    list.set_inner_html("");
    for row in &plan.rows {
        let item = document
            .create_element("div")
            .map_err(|_| "failed to create node row".to_string())?;
        match row {
            NodeRow::Separator => item.set_class_name(SEPARATOR_CLASS),
            NodeRow::Button(node) => {
                let button = document
                    .create_element("button")
                    .map_err(|_| "failed to create node button".to_string())?
                    .dyn_into::<HtmlButtonElement>()
                    .map_err(|_| "node button is not HtmlButtonElement".to_string())?;
                button.set_class_name(&node.class_name);
                button.set_text_content(Some(&node.label));
                button.set_disabled(node.disabled);
                let _ = button.set_attribute(NODE_DATA_ATTRIBUTE, &node.raw);
                let _ = item.append_child(&button);
            }
        }
        let _ = list.append_child(&item);
    }

    html_element(PAGE_INFO_ID)?.set_inner_text(&plan.page_info);
    set_button_disabled(PREV_PAGE_ID, plan.prev_disabled)?;
    set_button_disabled(NEXT_PAGE_ID, plan.next_disabled)?;

    let info_box = html_element(INFO_BOX_ID)?;
    match &plan.notification {
        Some(notification) => {
            info_box.set_inner_text(&notification.message);
            let _ = info_box.style().set_property("display", notification.display);
            let _ = info_box.style().set_property("opacity", notification.opacity);
        }
        None => {
            let _ = info_box.style().set_property("display", "none");
        }
    }
    Ok(())
}

fn set_button_disabled(id: &str, disabled: bool) -> Result<(), String> {
    html_element(id)?
        .dyn_into::<HtmlButtonElement>()
        .map_err(|_| format!("#{id} is not HtmlButtonElement"))?
        .set_disabled(disabled);
    Ok(())
}
