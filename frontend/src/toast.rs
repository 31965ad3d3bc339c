//! App-wide toast notifications. One `Toaster` sits at the root, owns the
//! host element, and hands a `ToastHandle` down through context; everything
//! else just calls `show`.

use gloo_timers::callback::Timeout;
use yew::prelude::*;

/// How long a toast stays up before it dismisses itself.
pub const TOAST_DISMISS_MS: u32 = 4500;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ToastIntent {
    Success,
    Error,
    Info,
}

impl ToastIntent {
    fn accent_class(self) -> &'static str {
        match self {
            ToastIntent::Success => "border-l-4 border-emerald-500",
            ToastIntent::Error => "border-l-4 border-red-500",
            ToastIntent::Info => "border-l-4 border-sky-500",
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Toast {
    pub id: u32,
    pub message: String,
    pub intent: ToastIntent,
    pub title: Option<String>,
}

/// Pure bookkeeping behind the host: id allocation and ordered storage.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct ToastStack {
    next_id: u32,
    toasts: Vec<Toast>,
}

impl ToastStack {
    pub fn push(&mut self, message: String, intent: ToastIntent, title: Option<String>) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.toasts.push(Toast { id, message, intent, title });
        id
    }

    pub fn dismiss(&mut self, id: u32) {
        self.toasts.retain(|t| t.id != id);
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

/// What pages get from context. Defaults to a no-op so a component rendered
/// outside the provider degrades silently instead of panicking.
#[derive(Clone, PartialEq, Default)]
pub struct ToastHandle {
    emit: Option<Callback<(String, ToastIntent, Option<String>)>>,
}

impl ToastHandle {
    pub fn show(&self, message: impl Into<String>, intent: ToastIntent, title: Option<String>) {
        if let Some(emit) = &self.emit {
            emit.emit((message.into(), intent, title));
        }
    }

    pub fn success(&self, message: impl Into<String>) {
        self.show(message, ToastIntent::Success, None);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.show(message, ToastIntent::Error, None);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.show(message, ToastIntent::Info, None);
    }
}

#[derive(Properties, PartialEq)]
pub struct ToasterProps {
    pub children: Children,
}

#[function_component(Toaster)]
pub fn toaster(props: &ToasterProps) -> Html {
    let stack = use_state(ToastStack::default);

    let handle = {
        let stack = stack.clone();
        ToastHandle {
            emit: Some(Callback::from(move |(message, intent, title)| {
                let mut next = (*stack).clone();
                next.push(message, intent, title);
                stack.set(next);
            })),
        }
    };

    let on_dismiss = {
        let stack = stack.clone();
        Callback::from(move |id: u32| {
            let mut next = (*stack).clone();
            next.dismiss(id);
            stack.set(next);
        })
    };

    html! {
        <ContextProvider<ToastHandle> context={handle}>
            { for props.children.iter() }
            {
                if stack.is_empty() {
                    html! {}
                } else {
                    html! {
                        <div class="fixed bottom-6 right-6 z-50 flex flex-col gap-3 w-80">
                            { for stack.toasts().iter().map(|toast| html! {
                                <ToastItem key={toast.id} toast={toast.clone()} on_dismiss={on_dismiss.clone()} />
                            }) }
                        </div>
                    }
                }
            }
        </ContextProvider<ToastHandle>>
    }
}

#[derive(Properties, PartialEq)]
struct ToastItemProps {
    toast: Toast,
    on_dismiss: Callback<u32>,
}

#[function_component(ToastItem)]
fn toast_item(props: &ToastItemProps) -> Html {
    let timer = use_mut_ref(|| None::<Timeout>);

    // Arm the auto-dismiss timer once per toast. Dropping the Timeout (on
    // dismiss or unmount) cancels it.
    {
        let timer = timer.clone();
        let on_dismiss = props.on_dismiss.clone();
        let id = props.toast.id;
        use_effect_with_deps(
            move |_| {
                let fire = on_dismiss.clone();
                *timer.borrow_mut() = Some(Timeout::new(TOAST_DISMISS_MS, move || {
                    fire.emit(id);
                }));
                move || {
                    timer.borrow_mut().take();
                }
            },
            id,
        );
    }

    // Hovering pauses the countdown; leaving re-arms it from the start.
    let on_mouse_enter = {
        let timer = timer.clone();
        Callback::from(move |_: MouseEvent| {
            if let Some(timeout) = timer.borrow_mut().take() {
                timeout.cancel();
            }
        })
    };

    let on_mouse_leave = {
        let timer = timer.clone();
        let on_dismiss = props.on_dismiss.clone();
        let id = props.toast.id;
        Callback::from(move |_: MouseEvent| {
            let fire = on_dismiss.clone();
            *timer.borrow_mut() = Some(Timeout::new(TOAST_DISMISS_MS, move || {
                fire.emit(id);
            }));
        })
    };

    let on_close = {
        let on_dismiss = props.on_dismiss.clone();
        let id = props.toast.id;
        Callback::from(move |_| on_dismiss.emit(id))
    };

    let class = format!(
        "bg-white rounded-xl shadow-lg border border-border px-4 py-3 flex items-start gap-3 {}",
        props.toast.intent.accent_class()
    );

    html! {
        <div {class} onmouseenter={on_mouse_enter} onmouseleave={on_mouse_leave}>
            <div class="flex-1">
                {
                    if let Some(title) = &props.toast.title {
                        html! { <p class="text-sm font-bold text-[#173E63]">{ title.clone() }</p> }
                    } else {
                        html! {}
                    }
                }
                <p class="text-sm text-slate-600">{ props.toast.message.clone() }</p>
            </div>
            <button class="text-slate-400 hover:text-slate-600 text-sm font-bold" onclick={on_close} aria-label="Dismiss">
                {"✕"}
            </button>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_allocates_increasing_ids() {
        let mut stack = ToastStack::default();
        let a = stack.push("saved".into(), ToastIntent::Success, None);
        let b = stack.push("failed".into(), ToastIntent::Error, Some("Upload".into()));
        assert_ne!(a, b);
        assert_eq!(stack.toasts().len(), 2);
        assert_eq!(stack.toasts()[1].title.as_deref(), Some("Upload"));
    }

    #[test]
    fn dismiss_removes_only_the_target() {
        let mut stack = ToastStack::default();
        let a = stack.push("one".into(), ToastIntent::Info, None);
        let b = stack.push("two".into(), ToastIntent::Info, None);
        stack.dismiss(a);
        assert_eq!(stack.toasts().len(), 1);
        assert_eq!(stack.toasts()[0].id, b);

        // dismissing an unknown id is a no-op
        stack.dismiss(999);
        assert_eq!(stack.toasts().len(), 1);
    }

    #[test]
    fn noop_handle_does_not_panic() {
        let handle = ToastHandle::default();
        handle.success("nothing to see");
        handle.error("still nothing");
    }
}
