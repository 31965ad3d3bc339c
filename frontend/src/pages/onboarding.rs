use wasm_bindgen_futures::spawn_local;
use web_sys::InputEvent;
use yew::prelude::*;

use crate::api::{self, ProfileResponse};
use crate::format::format_percent;
use crate::onboarding::{Step, Wizard};
use crate::toast::ToastHandle;
use crate::validate::is_valid_gstin;
use crate::page_shell;

#[function_component(OnboardingPage)]
pub fn onboarding_page() -> Html {
    let toast = use_context::<ToastHandle>().unwrap_or_default();

    let wizard = use_state(Wizard::new);

    let business_name = use_state(|| "".to_string());
    let gstin = use_state(|| "".to_string());
    let business_type = use_state(|| "retail".to_string());
    let address = use_state(|| "".to_string());
    let phone = use_state(|| "".to_string());
    let bank_name = use_state(|| "".to_string());
    let bank_account_number = use_state(|| "".to_string());
    let bank_ifsc = use_state(|| "".to_string());
    let form_error = use_state(|| None::<String>);
    let saving = use_state(|| false);

    {
        let wizard = wizard.clone();
        let business_name = business_name.clone();
        let gstin = gstin.clone();
        let business_type = business_type.clone();
        let address = address.clone();
        let phone = phone.clone();
        let bank_name = bank_name.clone();
        let bank_account_number = bank_account_number.clone();
        let bank_ifsc = bank_ifsc.clone();

        use_effect_with_deps(
            move |_| {
                spawn_local(async move {
                    if let Ok(resp) = api::get_json::<ProfileResponse>("/api/profile").await {
                        let profile = resp.profile;
                        business_name.set(profile.business_name.clone().unwrap_or_default());
                        gstin.set(profile.gstin.clone().unwrap_or_default());
                        if let Some(kind) = profile.business_type.clone() {
                            business_type.set(kind);
                        }
                        address.set(profile.address.clone().unwrap_or_default());
                        phone.set(profile.phone.clone().unwrap_or_default());
                        bank_name.set(profile.bank_name.clone().unwrap_or_default());
                        bank_account_number.set(profile.bank_account_number.clone().unwrap_or_default());
                        bank_ifsc.set(profile.bank_ifsc.clone().unwrap_or_default());

                        let mut next = (*wizard).clone();
                        next.set_pct(Step::Profile, profile.profile_completion_pct);
                        next.set_pct(Step::Catalog, profile.catalog_completion_pct);
                        next.set_pct(Step::Inventory, profile.inventory_completion_pct);
                        next.set_pct(Step::Integrations, profile.integrations_completion_pct);
                        wizard.set(next);
                    }
                });
                || ()
            },
            (),
        );
    }

    let on_select_step = {
        let wizard = wizard.clone();
        Callback::from(move |step: Step| {
            let mut next = (*wizard).clone();
            next.activate(step);
            wizard.set(next);
        })
    };

    let on_complete_step = {
        let wizard = wizard.clone();
        let toast = toast.clone();
        Callback::from(move |step: Step| {
            let mut next = (*wizard).clone();
            next.complete(step);
            let done = next.is_done();
            wizard.set(next);
            if done {
                toast.show(
                    "Setup complete. Your books are ready.",
                    crate::toast::ToastIntent::Success,
                    Some("All set!".to_string()),
                );
            } else {
                toast.success(format!("{} marked complete.", step.title()));
            }
        })
    };

    let on_save_profile = {
        let wizard = wizard.clone();
        let business_name = business_name.clone();
        let gstin = gstin.clone();
        let business_type = business_type.clone();
        let address = address.clone();
        let phone = phone.clone();
        let bank_name = bank_name.clone();
        let bank_account_number = bank_account_number.clone();
        let bank_ifsc = bank_ifsc.clone();
        let form_error = form_error.clone();
        let saving = saving.clone();
        let toast = toast.clone();

        Callback::from(move |_| {
            let gstin_val = gstin.trim().to_uppercase();
            if !gstin_val.is_empty() && !is_valid_gstin(&gstin_val) {
                form_error.set(Some("GSTIN must be 15 letters and digits.".to_string()));
                return;
            }
            form_error.set(None);
            saving.set(true);

            let wizard = wizard.clone();
            let business_name = business_name.clone();
            let business_type = business_type.clone();
            let address = address.clone();
            let phone = phone.clone();
            let bank_name = bank_name.clone();
            let bank_account_number = bank_account_number.clone();
            let bank_ifsc = bank_ifsc.clone();
            let form_error = form_error.clone();
            let saving = saving.clone();
            let toast = toast.clone();

            spawn_local(async move {
                let payload = serde_json::json!({
                    "business_name": business_name.trim(),
                    "gstin": gstin_val,
                    "business_type": (*business_type).clone(),
                    "address": address.trim(),
                    "phone": phone.trim(),
                    "bank_name": bank_name.trim(),
                    "bank_account_number": bank_account_number.trim(),
                    "bank_ifsc": bank_ifsc.trim(),
                });

                match api::post_json::<ProfileResponse, _>("/api/profile", &payload).await {
                    Ok(resp) => {
                        let mut next = (*wizard).clone();
                        next.set_pct(Step::Profile, resp.profile.profile_completion_pct);
                        if resp.profile.profile_completion_pct >= 100 {
                            next.complete(Step::Profile);
                        }
                        wizard.set(next);
                        toast.success("Business profile saved.");
                    }
                    Err(msg) => form_error.set(Some(msg)),
                }
                saving.set(false);
            });
        })
    };

    let text_input = |label: &'static str,
                      placeholder: &'static str,
                      state: &UseStateHandle<String>| {
        let state = state.clone();
        html! {
            <div class="space-y-1">
                <label class="text-[12px] font-bold text-muted-foreground">{ label }</label>
                <input
                    placeholder={placeholder}
                    value={(*state).clone()}
                    oninput={Callback::from(move |e: InputEvent| {
                        let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                        state.set(input.value());
                    })}
                    class="w-full bg-[#f1f4f9] rounded-[10px] px-3 py-2 text-sm text-[#173E63] border-none"
                />
            </div>
        }
    };

    let active = wizard.active();

    html! {
        { page_shell(
            "Get Set Up",
            html! {
                <span class="text-sm font-bold text-muted-foreground">
                    { format!("Overall: {}", format_percent(wizard.overall())) }
                </span>
            },
            html! {
                <>
                    <div class="h-2 w-full bg-secondary rounded-full overflow-hidden">
                        <div class="h-full bg-primary transition-all" style={format!("width: {}%", wizard.overall().clamp(0, 100))}></div>
                    </div>

                    <div class="grid grid-cols-2 md:grid-cols-4 gap-3">
                        { for Step::ALL.iter().map(|step| {
                            let step = *step;
                            let is_active = step == active;
                            let class_name = if is_active {
                                "flex flex-col gap-1 p-4 rounded-xl border-2 border-[#173E63] bg-white text-left"
                            } else {
                                "flex flex-col gap-1 p-4 rounded-xl border border-border bg-card hover:bg-white transition-colors text-left"
                            };
                            let on_select = on_select_step.clone();
                            html! {
                                <button type="button" class={class_name} onclick={Callback::from(move |_| on_select.emit(step))}>
                                    <span class="text-sm font-bold text-[#173E63]">{ step.title() }</span>
                                    <span class="text-xs text-muted-foreground">{ format_percent(wizard.pct(step)) }</span>
                                </button>
                            }
                        }) }
                    </div>

                    <div class="bg-card rounded-[10px] p-6 border border-border space-y-4">
                        <div>
                            <h3 class="font-bold text-foreground text-lg">{ active.title() }</h3>
                            <p class="text-sm text-muted-foreground">{ active.blurb() }</p>
                        </div>

                        {
                            if active == Step::Profile {
                                html! {
                                    <>
                                        <div class="grid grid-cols-1 md:grid-cols-2 gap-4">
                                            { text_input("Business Name", "e.g. Sharma Kirana Store", &business_name) }
                                            { text_input("GSTIN", "15-character GSTIN", &gstin) }
                                            <div class="space-y-1">
                                                <label class="text-[12px] font-bold text-muted-foreground">{"Business Type"}</label>
                                                <select value={(*business_type).clone()} onchange={{
                                                    let business_type = business_type.clone();
                                                    Callback::from(move |e: Event| {
                                                        let input: web_sys::HtmlSelectElement = e.target_unchecked_into();
                                                        business_type.set(input.value());
                                                    })
                                                }} class="w-full bg-[#f1f4f9] rounded-[10px] px-3 py-2 text-sm border-none">
                                                    <option value="retail">{"Retail"}</option>
                                                    <option value="wholesale">{"Wholesale"}</option>
                                                    <option value="services">{"Services"}</option>
                                                    <option value="other">{"Other"}</option>
                                                </select>
                                            </div>
                                            { text_input("Phone", "Mobile number", &phone) }
                                            { text_input("Address", "Shop address", &address) }
                                            { text_input("Bank Name", "Bank", &bank_name) }
                                            { text_input("Account Number", "Account number", &bank_account_number) }
                                            { text_input("IFSC", "IFSC code", &bank_ifsc) }
                                        </div>
                                        {
                                            if let Some(msg) = &*form_error {
                                                html! { <p class="text-sm text-red-500">{ msg.clone() }</p> }
                                            } else { html!{} }
                                        }
                                        <button onclick={on_save_profile} class="bg-primary text-primary-foreground px-6 py-2 rounded-xl font-bold text-sm" disabled={*saving}>
                                            { if *saving { "Saving..." } else { "Save Profile" } }
                                        </button>
                                    </>
                                }
                            } else {
                                let on_complete = on_complete_step.clone();
                                html! {
                                    <button
                                        onclick={Callback::from(move |_| on_complete.emit(active))}
                                        class="bg-primary text-primary-foreground px-6 py-2 rounded-xl font-bold text-sm"
                                        disabled={wizard.pct(active) >= 100}
                                    >
                                        { if wizard.pct(active) >= 100 { "Done" } else { "Mark Complete" } }
                                    </button>
                                }
                            }
                        }
                    </div>
                </>
            }
        ) }
    }
}
