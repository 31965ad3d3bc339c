use wasm_bindgen_futures::spawn_local;
use web_sys::InputEvent;
use yew::prelude::*;

mod aggregate;
mod api;
mod format;
mod onboarding;
mod pages;
mod toast;
mod validate;

use api::{ApiUser, LoginResponse, MeResponse};
use pages::bills::BillUploadPage;
use pages::dashboard::DashboardPage;
use pages::insights::InsightsPage;
use pages::landing::LandingPage;
use pages::onboarding::OnboardingPage;
use pages::voice::VoiceEntryPage;
use toast::{ToastHandle, Toaster};

#[derive(Clone, Copy, PartialEq)]
enum AuthStatus {
    Checking,
    Authenticated,
    Unauthenticated,
}

#[derive(Clone, Copy, PartialEq)]
enum Page {
    Dashboard,
    Insights,
    Voice,
    Bills,
    Onboarding,
}

#[derive(Properties, PartialEq)]
struct LayoutProps {
    children: Children,
    active_page: Page,
    on_select: Callback<Page>,
    user: Option<ApiUser>,
}

#[function_component(Layout)]
fn layout(props: &LayoutProps) -> Html {
    html! {
        <div class="flex h-screen bg-background">
            <div class="hidden md:flex">
                <Sidebar active_page={props.active_page} on_select={props.on_select.clone()} />
            </div>

            <div class="flex-1 flex flex-col overflow-hidden">
                <Header user={props.user.clone()} />
                <main class="flex-1 overflow-y-auto">
                    { for props.children.iter() }
                </main>
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct HeaderProps {
    user: Option<ApiUser>,
}

#[function_component(Header)]
fn header(props: &HeaderProps) -> Html {
    html! {
        <header class="bg-[#D8E1E8] border-b border-border h-16 flex items-center justify-between px-6">
            <div class="flex-1"></div>
            <div class="flex items-center gap-3">
                {
                    if let Some(user) = &props.user {
                        html! {
                            <>
                                <span class="text-sm font-bold text-[#173E63]">{ user.username.clone() }</span>
                                <div class="w-9 h-9 bg-[#173E63] rounded-full flex items-center justify-center text-white text-sm font-black uppercase">
                                    { user.username.chars().next().map(|c| c.to_string()).unwrap_or_else(|| "L".to_string()) }
                                </div>
                            </>
                        }
                    } else {
                        html! {}
                    }
                }
            </div>
        </header>
    }
}

struct NavItem {
    label: &'static str,
    page: Page,
    icon: fn() -> Html,
}

#[derive(Properties, PartialEq)]
struct SidebarProps {
    active_page: Page,
    on_select: Callback<Page>,
}

#[function_component(Sidebar)]
fn sidebar(props: &SidebarProps) -> Html {
    let nav_items = vec![
        NavItem {
            label: "Dashboard",
            page: Page::Dashboard,
            icon: icon_layout_grid,
        },
        NavItem {
            label: "Insights",
            page: Page::Insights,
            icon: icon_bar_chart,
        },
        NavItem {
            label: "Voice Entry",
            page: Page::Voice,
            icon: icon_mic,
        },
        NavItem {
            label: "Bill Upload",
            page: Page::Bills,
            icon: icon_upload,
        },
        NavItem {
            label: "Get Set Up",
            page: Page::Onboarding,
            icon: icon_clipboard,
        },
    ];

    let on_logout = Callback::from(move |_| {
        spawn_local(async move {
            let _ =
                api::post_json::<serde_json::Value, _>("/api/logout", &serde_json::json!({})).await;
            api::clear_auth_token();
            if let Some(window) = web_sys::window() {
                let _ = window.location().reload();
            }
        });
    });

    html! {
        <div class="w-[220px] h-screen bg-[#D8E1E8] p-4 flex flex-col">
            <div class="flex items-center gap-3 px-2 mb-8">
                <div class="w-12 h-12 bg-[#173E63] rounded-full flex items-center justify-center text-white text-xl font-black">{"L"}</div>
                <span class="text-[#173E63] text-2xl font-black tracking-tight">{"Ledgerly"}</span>
            </div>

            <div class="flex-1 bg-[#173E63] rounded-[24px] flex flex-col py-6 px-3 shadow-lg">
                <nav class="flex-1 space-y-2">
                    { for nav_items.iter().map(|item| {
                        let is_active = item.page == props.active_page;
                        let class_name = if is_active {
                            "flex items-center gap-3 px-4 py-3 rounded-xl transition-all text-[13px] font-medium bg-[#B2CBDE] text-[#173E63] w-full"
                        } else {
                            "flex items-center gap-3 px-4 py-3 rounded-xl transition-all text-[13px] font-medium text-slate-300 hover:bg-white/5 hover:text-white w-full"
                        };
                        let on_select = props.on_select.clone();
                        let page = item.page;

                        html! {
                            <button type="button" class={class_name} onclick={Callback::from(move |_| on_select.emit(page))}>
                                <span class="shrink-0">{ (item.icon)() }</span>
                                <span class="truncate whitespace-nowrap text-left">{ item.label }</span>
                            </button>
                        }
                    }) }
                </nav>

                <div class="mt-auto pt-4">
                    <button onclick={on_logout} class="flex items-center gap-3 w-full px-4 py-3 rounded-xl hover:bg-white/10 transition-colors text-[13px] font-medium text-slate-300">
                        { icon_log_out() }
                        <span>{"Log Out"}</span>
                    </button>
                </div>
            </div>
        </div>
    }
}

pub(crate) fn page_shell(title: &'static str, actions: Html, children: Html) -> Html {
    html! {
        <div class="p-6 max-w-7xl mx-auto">
            <div class="flex items-center justify-between pb-4 border-b border-border">
                <h1 class="text-2xl font-bold text-foreground">{ title }</h1>
                { actions }
            </div>
            <div class="pt-5 space-y-6">
                { children }
            </div>
        </div>
    }
}

#[function_component(App)]
fn app() -> Html {
    let active_page = use_state(|| Page::Dashboard);
    let auth_status = use_state(|| AuthStatus::Checking);
    let user = use_state(|| None::<ApiUser>);

    let on_select = {
        let active_page = active_page.clone();
        Callback::from(move |page: Page| active_page.set(page))
    };

    {
        let auth_status = auth_status.clone();
        let user = user.clone();
        use_effect_with_deps(
            move |_| {
                spawn_local(async move {
                    match api::get_json::<MeResponse>("/api/me").await {
                        Ok(resp) => match resp.user {
                            Some(me) => {
                                user.set(Some(me));
                                auth_status.set(AuthStatus::Authenticated);
                            }
                            None => auth_status.set(AuthStatus::Unauthenticated),
                        },
                        Err(_) => {
                            // Offline or mid-deploy: an existing token keeps
                            // the session alive instead of bouncing to login.
                            if api::auth_token().is_some() {
                                auth_status.set(AuthStatus::Authenticated);
                            } else {
                                auth_status.set(AuthStatus::Unauthenticated);
                            }
                        }
                    }
                });
                || ()
            },
            (),
        );
    }

    let on_authenticated = {
        let auth_status = auth_status.clone();
        let user = user.clone();
        Callback::from(move |_| {
            auth_status.set(AuthStatus::Authenticated);
            let user = user.clone();
            spawn_local(async move {
                if let Ok(resp) = api::get_json::<MeResponse>("/api/me").await {
                    user.set(resp.user);
                }
            });
        })
    };

    let content = match *active_page {
        Page::Dashboard => html! { <DashboardPage /> },
        Page::Insights => html! { <InsightsPage /> },
        Page::Voice => html! { <VoiceEntryPage /> },
        Page::Bills => html! { <BillUploadPage /> },
        Page::Onboarding => html! { <OnboardingPage /> },
    };

    let body = match *auth_status {
        AuthStatus::Checking => html! {
            <div class="min-h-screen flex items-center justify-center bg-background text-muted-foreground">
                {"Checking session..."}
            </div>
        },
        AuthStatus::Unauthenticated => html! {
            <LandingPage on_authenticated={on_authenticated} />
        },
        AuthStatus::Authenticated => html! {
            <Layout active_page={*active_page} on_select={on_select} user={(*user).clone()}>
                { content }
            </Layout>
        },
    };

    html! {
        <Toaster>
            { body }
        </Toaster>
    }
}

#[derive(Properties, PartialEq)]
pub struct AuthScreenProps {
    pub on_authenticated: Callback<()>,
}

#[function_component(AuthScreen)]
pub fn auth_screen(props: &AuthScreenProps) -> Html {
    let toast = use_context::<ToastHandle>().unwrap_or_default();

    let is_login = use_state(|| true);
    let username = use_state(|| "".to_string());
    let identifier = use_state(|| "".to_string());
    let password = use_state(|| "".to_string());
    let confirm_password = use_state(|| "".to_string());
    let remember = use_state(|| false);
    let error = use_state(|| None::<String>);
    let loading = use_state(|| false);

    let on_submit = {
        let is_login = is_login.clone();
        let username = username.clone();
        let identifier = identifier.clone();
        let password = password.clone();
        let confirm_password = confirm_password.clone();
        let remember = remember.clone();
        let error = error.clone();
        let loading = loading.clone();
        let toast = toast.clone();
        let on_authenticated = props.on_authenticated.clone();

        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let login_mode = *is_login;
            let username_val = (*username).clone();
            let identifier_val = (*identifier).clone();
            let password_val = (*password).clone();
            let confirm_val = (*confirm_password).clone();
            let remember_val = *remember;

            // Client-side checks run first; nothing is sent until they pass.
            let validation = if login_mode {
                validate::validate_login(&identifier_val, &password_val)
            } else {
                validate::validate_register(
                    &username_val,
                    &identifier_val,
                    &password_val,
                    &confirm_val,
                )
            };
            if let Err(msg) = validation {
                error.set(Some(msg));
                return;
            }

            loading.set(true);
            error.set(None);

            let is_login = is_login.clone();
            let error = error.clone();
            let loading = loading.clone();
            let toast = toast.clone();
            let on_authenticated = on_authenticated.clone();

            spawn_local(async move {
                if login_mode {
                    let payload = serde_json::json!({
                        "identifier": identifier_val,
                        "password": password_val,
                        "remember": remember_val,
                    });
                    match api::post_json::<LoginResponse, _>("/api/login", &payload).await {
                        Ok(resp) => {
                            if let Some(token) = resp.token.as_deref() {
                                api::store_auth_token(token);
                            }
                            on_authenticated.emit(());
                        }
                        Err(msg) => error.set(Some(msg)),
                    }
                } else {
                    let payload = serde_json::json!({
                        "username": username_val,
                        "email": identifier_val,
                        "password": password_val,
                    });
                    match api::post_json::<serde_json::Value, _>("/api/register", &payload).await {
                        Ok(_) => {
                            toast.success("Account created. Sign in to continue.");
                            is_login.set(true);
                        }
                        Err(msg) => error.set(Some(msg)),
                    }
                }
                loading.set(false);
            });
        })
    };

    let toggle_mode = {
        let is_login = is_login.clone();
        let error = error.clone();
        Callback::from(move |_| {
            is_login.set(!*is_login);
            error.set(None);
        })
    };

    html! {
        <div class="w-full max-w-md bg-card border border-border rounded-2xl shadow-lg p-8">
            <div class="text-center mb-6">
                <h1 class="text-2xl font-bold text-foreground">{ if *is_login { "Welcome back" } else { "Create account" } }</h1>
                <p class="text-sm text-muted-foreground mt-2">
                    { if *is_login { "Sign in to your khata." } else { "Start keeping your books in minutes." } }
                </p>
            </div>

            <form class="space-y-4" onsubmit={on_submit}>
                if !*is_login {
                    <div class="space-y-1">
                        <label class="text-sm font-medium text-foreground">{"Business or Owner Name"}</label>
                        <input
                            type="text"
                            class="w-full px-4 py-2 bg-input border border-input rounded-lg text-foreground focus:outline-none focus:ring-2 focus:ring-primary"
                            value={(*username).clone()}
                            oninput={{
                                let username = username.clone();
                                Callback::from(move |e: InputEvent| {
                                    let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                                    username.set(input.value());
                                })
                            }}
                        />
                    </div>
                }

                <div class="space-y-1">
                    <label class="text-sm font-medium text-foreground">
                        { if *is_login { "Email or Username" } else { "Email" } }
                    </label>
                    <input
                        type="text"
                        class="w-full px-4 py-2 bg-input border border-input rounded-lg text-foreground focus:outline-none focus:ring-2 focus:ring-primary"
                        value={(*identifier).clone()}
                        oninput={{
                            let identifier = identifier.clone();
                            Callback::from(move |e: InputEvent| {
                                let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                                identifier.set(input.value());
                            })
                        }}
                    />
                </div>

                <div class="space-y-1">
                    <label class="text-sm font-medium text-foreground">{"Password"}</label>
                    <input
                        type="password"
                        class="w-full px-4 py-2 bg-input border border-input rounded-lg text-foreground focus:outline-none focus:ring-2 focus:ring-primary"
                        value={(*password).clone()}
                        oninput={{
                            let password = password.clone();
                            Callback::from(move |e: InputEvent| {
                                let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                                password.set(input.value());
                            })
                        }}
                    />
                </div>

                if !*is_login {
                    <div class="space-y-1">
                        <label class="text-sm font-medium text-foreground">{"Confirm Password"}</label>
                        <input
                            type="password"
                            class="w-full px-4 py-2 bg-input border border-input rounded-lg text-foreground focus:outline-none focus:ring-2 focus:ring-primary"
                            value={(*confirm_password).clone()}
                            oninput={{
                                let confirm_password = confirm_password.clone();
                                Callback::from(move |e: InputEvent| {
                                    let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                                    confirm_password.set(input.value());
                                })
                            }}
                        />
                    </div>
                }

                if *is_login {
                    <label class="flex items-center gap-2 text-sm text-muted-foreground">
                        <input type="checkbox" checked={*remember} onclick={{
                            let remember = remember.clone();
                            Callback::from(move |_| remember.set(!*remember))
                        }} />
                        {"Keep me signed in"}
                    </label>
                }

                if let Some(msg) = &*error {
                    <div class="text-sm text-red-500">{ msg.clone() }</div>
                }

                <button
                    type="submit"
                    class="w-full bg-primary text-primary-foreground py-2 rounded-lg font-semibold hover:opacity-90 transition-opacity"
                    disabled={*loading}
                >
                    { if *loading { "Please wait..." } else if *is_login { "Login" } else { "Sign up" } }
                </button>
            </form>

            <div class="mt-6 text-center text-sm text-muted-foreground">
                { if *is_login { "No account?" } else { "Already have an account?" } }
                <button class="ml-2 text-primary font-semibold" onclick={toggle_mode}>
                    { if *is_login { "Sign up" } else { "Login" } }
                </button>
            </div>
        </div>
    }
}

fn icon_base(path: &'static str) -> Html {
    html! {
        <svg width="20" height="20" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round" class="text-foreground">
            <path d={path}></path>
        </svg>
    }
}

fn icon_layout_grid() -> Html {
    icon_base("M3 3h8v8H3zM13 3h8v8h-8zM3 13h8v8H3zM13 13h8v8h-8z")
}
pub(crate) fn icon_wallet() -> Html {
    icon_base("M3 7h18v10H3zM16 7V5H5v2")
}
pub(crate) fn icon_trending_up() -> Html {
    icon_base("M3 17l6-6 4 4 7-7")
}
pub(crate) fn icon_credit_card() -> Html {
    icon_base("M3 7h18v10H3zM3 11h18")
}
fn icon_bar_chart() -> Html {
    icon_base("M4 20V10M10 20V4M16 20v-6M22 20H2")
}
fn icon_log_out() -> Html {
    icon_base("M9 21H5a2 2 0 01-2-2V5a2 2 0 012-2h4M16 17l5-5-5-5M21 12H9")
}
pub(crate) fn icon_plus() -> Html {
    icon_base("M12 5v14M5 12h14")
}
pub(crate) fn icon_refresh() -> Html {
    icon_base("M21 12a9 9 0 11-3-6.7M21 3v6h-6")
}
pub(crate) fn icon_mic() -> Html {
    icon_base("M12 2a3 3 0 013 3v6a3 3 0 01-6 0V5a3 3 0 013-3zM19 10v1a7 7 0 01-14 0v-1M12 18v4M8 22h8")
}
pub(crate) fn icon_upload() -> Html {
    icon_base("M21 15v4a2 2 0 01-2 2H5a2 2 0 01-2-2v-4M17 8l-5-5-5 5M12 3v12")
}
fn icon_clipboard() -> Html {
    icon_base("M9 2h6v4H9zM9 4H6a2 2 0 00-2 2v14a2 2 0 002 2h12a2 2 0 002-2V6a2 2 0 00-2-2h-3")
}

fn main() {
    yew::Renderer::<App>::new().render();
}
