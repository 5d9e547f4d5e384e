mod ads;
mod audio;
mod game;
mod input;
mod net;
mod time;

use std::{cell::RefCell, io, rc::Rc};

use ratzilla::event::{KeyCode, MouseButton, MouseEventKind};
use ratzilla::ratatui::Terminal;
use ratzilla::{DomBackend, WebRenderer};

use game::{Effect, MilkGame};
use input::{ClickState, InputEvent};

/// Convert a mouse position in page pixels to a terminal cell, using the
/// grid container's bounding rect.
fn dom_pixel_to_cell(mouse_x: u32, mouse_y: u32, cs: &ClickState) -> Option<(u16, u16)> {
    let window = web_sys::window()?;
    let document = window.document()?;

    // DomBackend creates a <div> as the grid container inside <body>.
    let grid = document.query_selector("body > div").ok()??;
    let rect = grid.get_bounding_client_rect();

    let col = input::pixel_to_cell(mouse_x as f64 - rect.left(), rect.width(), cs.terminal_cols)?;
    let row = input::pixel_to_cell(mouse_y as f64 - rect.top(), rect.height(), cs.terminal_rows)?;
    Some((col, row))
}

/// Origin, pathname, and query of the current page.
#[cfg(target_arch = "wasm32")]
fn location_parts() -> Option<(String, String, String)> {
    let location = web_sys::window()?.location();
    Some((
        location.origin().ok()?,
        location.pathname().ok()?,
        location.search().ok()?,
    ))
}

/// Fire-and-forget clipboard write through `navigator.clipboard`.
#[cfg(target_arch = "wasm32")]
fn copy_to_clipboard(text: &str) {
    use wasm_bindgen::JsCast;

    let Some(window) = web_sys::window() else { return };
    let Ok(clipboard) = js_sys::Reflect::get(&window.navigator(), &"clipboard".into()) else {
        return;
    };
    let Ok(write) = js_sys::Reflect::get(&clipboard, &"writeText".into()) else {
        return;
    };
    if let Some(func) = write.dyn_ref::<js_sys::Function>() {
        let _ = func.call1(&clipboard, &text.into());
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn copy_to_clipboard(_text: &str) {}

/// Run a side effect requested by the game, outside its borrow.
fn run_effect(game: &Rc<RefCell<MilkGame>>, effect: Effect) {
    match effect {
        Effect::None => {}
        Effect::WatchAd => {
            #[cfg(target_arch = "wasm32")]
            ads::trigger_ad(game.clone());
        }
        Effect::SubmitWithdrawal { address, amount } => {
            #[cfg(target_arch = "wasm32")]
            net::submit_withdrawal(game.clone(), address, amount);
            #[cfg(not(target_arch = "wasm32"))]
            let _ = (address, amount);
        }
        Effect::CopyInviteLink => {
            let link = game.borrow().share_link.clone();
            match link {
                Some(link) => {
                    copy_to_clipboard(&link);
                    game.borrow_mut().notify("Invite link copied!");
                }
                None => game.borrow_mut().notify("Link not ready yet."),
            }
        }
    }
}

fn dispatch(game: &Rc<RefCell<MilkGame>>, event: InputEvent) {
    let effect = game.borrow_mut().handle_input(&event);
    run_effect(game, effect);
}

fn main() -> io::Result<()> {
    console_error_panic_hook::set_once();

    let now = time::now_ms();
    let game = Rc::new(RefCell::new(MilkGame::new(now)));

    // Session-start reconciliation: identity, pending referrer credit,
    // inbound invite link, offline earnings.
    {
        let mut g = game.borrow_mut();
        #[cfg(target_arch = "wasm32")]
        {
            let mut delivery = game::referral::StorageDelivery::default();
            let (origin, path, query) = location_parts().unwrap_or_default();
            let inbound = game::referral::referrer_from_query(&query);
            g.startup(now, inbound.as_deref(), &mut delivery);
            if let Some(id) = g.state.referral.self_id.clone() {
                g.share_link = Some(game::referral::referral_link(&origin, &path, &id));
            }
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            let mut delivery = game::referral::MemoryDelivery::default();
            g.startup(now, None, &mut delivery);
        }
    }

    let click_state = Rc::new(RefCell::new(ClickState::new()));
    let backend = DomBackend::new()?;
    let mut terminal = Terminal::new(backend)?;

    // Mouse/touch handler.
    terminal.on_mouse_event({
        let game = game.clone();
        let click_state = click_state.clone();
        move |mouse_event| {
            if mouse_event.kind != MouseEventKind::ButtonDown(MouseButton::Left) {
                return;
            }

            let action = {
                let cs = click_state.borrow();
                if cs.terminal_rows == 0 || cs.terminal_cols == 0 {
                    return;
                }
                cs.hit_test(mouse_event.col, mouse_event.row)
            };

            if let Some(action_id) = action {
                dispatch(&game, InputEvent::Click(action_id));
            }
        }
    });

    // Keyboard handler.
    terminal.on_key_event({
        let game = game.clone();
        move |key_event| {
            let event = match key_event.code {
                KeyCode::Char(c) => InputEvent::Key(c),
                KeyCode::Backspace => InputEvent::Backspace,
                KeyCode::Enter => InputEvent::Enter,
                KeyCode::Tab => InputEvent::Tab,
                KeyCode::Esc => InputEvent::Escape,
                _ => return,
            };
            dispatch(&game, event);
        }
    });

    // Frame loop: drives the 1s engine tick, 5s persistence flush, and
    // 10s ambient roll, then renders.
    terminal.draw_web({
        let game = game.clone();
        let click_state = click_state.clone();
        move |f| {
            let mut g = game.borrow_mut();
            g.advance_frame(time::now_ms());

            let size = f.area();
            {
                let mut cs = click_state.borrow_mut();
                cs.terminal_cols = size.width;
                cs.terminal_rows = size.height;
                cs.clear_targets();
            }

            game::render::render(&g, f, size, &click_state);
        }
    });

    Ok(())
}
